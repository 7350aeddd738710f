//! X-Road SOAP envelope construction.
//!
//! Pure functions filling the fixed envelope template. Output is
//! deterministic for identical inputs, so the real and log envelopes built
//! from the same header and request id differ only in the payload segment.

use crate::core::config::{TrembitaHeaderConfig, XroadIdentity};

pub const DEFAULT_BODY_NAMESPACE: &str = "http://provider-gateway/xsd";

fn identity_block(tag: &str, object_type: &str, identity: &XroadIdentity) -> String {
    format!(
        r#"      <xro:{tag} iden:objectType="{object_type}">
         <iden:xRoadInstance>{instance}</iden:xRoadInstance>
         <iden:memberClass>{member_class}</iden:memberClass>
         <iden:memberCode>{member_code}</iden:memberCode>
         <iden:subsystemCode>{subsystem_code}</iden:subsystemCode>
      </xro:{tag}>"#,
        tag = tag,
        object_type = object_type,
        instance = identity.instance,
        member_class = identity.member_class,
        member_code = identity.member_code,
        subsystem_code = identity.subsystem_code,
    )
}

fn header_block(header: &TrembitaHeaderConfig, request_id: &str) -> String {
    format!(
        r#"   <soapenv:Header>
{client}
{service}
      <xro:userId>{user_id}</xro:userId>
      <xro:id>{request_id}</xro:id>
      <xro:protocolVersion>{protocol_version}</xro:protocolVersion>
   </soapenv:Header>"#,
        client = identity_block("client", "SUBSYSTEM", &header.client),
        service = identity_block("service", "SERVICE", &header.service),
        user_id = header.user_id,
        request_id = request_id,
        protocol_version = header.protocol_version,
    )
}

fn body_namespace(header: &TrembitaHeaderConfig) -> &str {
    header
        .body_namespace
        .as_deref()
        .unwrap_or(DEFAULT_BODY_NAMESPACE)
}

/// Envelope carrying a base64-encoded data payload.
pub fn build_data_envelope(
    header: &TrembitaHeaderConfig,
    request_id: &str,
    payload_base64: &str,
) -> String {
    format!(
        r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xro="http://x-road.eu/xsd/xroad.xsd" xmlns:iden="http://x-road.eu/xsd/identifiers" xmlns:prov="{namespace}">
{header}
   <soapenv:Body>
      <prov:sendData>
         <prov:data>{payload}</prov:data>
      </prov:sendData>
   </soapenv:Body>
</soapenv:Envelope>"#,
        namespace = body_namespace(header),
        header = header_block(header, request_id),
        payload = payload_base64,
    )
}

/// Service-discovery envelope; no payload, no document context.
pub fn build_list_methods_envelope(header: &TrembitaHeaderConfig, request_id: &str) -> String {
    format!(
        r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xro="http://x-road.eu/xsd/xroad.xsd" xmlns:iden="http://x-road.eu/xsd/identifiers" xmlns:prov="{namespace}">
{header}
   <soapenv:Body>
      <xro:listMethods/>
   </soapenv:Body>
</soapenv:Envelope>"#,
        namespace = body_namespace(header),
        header = header_block(header, request_id),
    )
}
