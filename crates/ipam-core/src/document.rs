//! Metadata interface document
//!
//! Typed model of the XML document served by the host metadata service and
//! the decoder that produces it.
//!
//! ```xml
//! <Interfaces>
//!   <Interface MacAddress="000D3A6E1C2B" IsPrimary="true">
//!     <IPSubnet Prefix="10.0.0.0/24">
//!       <IPAddress Address="10.0.0.4" IsPrimary="true"/>
//!       <IPAddress Address="10.0.0.5" IsPrimary="false"/>
//!     </IPSubnet>
//!   </Interface>
//! </Interfaces>
//! ```
//!
//! Unknown elements and attributes are ignored and missing attributes take
//! their default (empty string, `false`); anything structurally broken fails
//! the whole decode.

use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::{Deserialize, Deserializer};

/// Name of the document's root element
const ROOT_ELEMENT: &str = "Interfaces";

/// Decoded `<Interfaces>` document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename = "Interfaces")]
pub struct InterfaceDocument {
    #[serde(rename = "Interface", default)]
    pub interfaces: Vec<InterfaceDescriptor>,
}

/// One `<Interface>` element
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InterfaceDescriptor {
    /// MAC address, compared case- and separator-insensitively
    #[serde(rename = "@MacAddress", default)]
    pub mac_address: String,

    #[serde(rename = "@IsPrimary", default, deserialize_with = "flag")]
    pub is_primary: bool,

    #[serde(rename = "IPSubnet", default)]
    pub subnets: Vec<SubnetDescriptor>,
}

/// One `<IPSubnet>` element
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubnetDescriptor {
    /// CIDR prefix (e.g., "10.0.0.0/24")
    #[serde(rename = "@Prefix", default)]
    pub prefix: String,

    #[serde(rename = "IPAddress", default)]
    pub addresses: Vec<AddressDescriptor>,
}

/// One `<IPAddress>` element
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AddressDescriptor {
    /// IP literal
    #[serde(rename = "@Address", default)]
    pub address: String,

    /// Primary addresses belong to the host and are never pooled
    #[serde(rename = "@IsPrimary", default, deserialize_with = "flag")]
    pub is_primary: bool,
}

impl InterfaceDocument {
    /// Total number of address entries across all interfaces and subnets
    pub fn address_count(&self) -> usize {
        self.interfaces
            .iter()
            .flat_map(|i| &i.subnets)
            .map(|s| s.addresses.len())
            .sum()
    }
}

/// Decode a metadata response body
///
/// # Errors
///
/// [`Error::Decode`] when the body is not UTF-8, not well-formed XML, has a
/// root other than `<Interfaces>`, or carries a boolean attribute that is not
/// a recognizable flag.
pub fn decode(body: &[u8]) -> Result<InterfaceDocument> {
    let text = std::str::from_utf8(body)
        .map_err(|e| Error::decode(format!("body is not valid UTF-8: {}", e)))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    check_root(text)?;
    quick_xml::de::from_str(text).map_err(|e| Error::decode(e.to_string()))
}

/// Reject documents whose first element is not `<Interfaces>`
///
/// The deserializer ignores the root name, so an error body such as
/// `<Error>...</Error>` would otherwise decode to an empty document.
fn check_root(text: &str) -> Result<()> {
    let mut reader = Reader::from_str(text);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = e.local_name();
                if name.as_ref() == ROOT_ELEMENT.as_bytes() {
                    return Ok(());
                }
                return Err(Error::decode(format!(
                    "unexpected root element <{}>, expected <{}>",
                    String::from_utf8_lossy(name.as_ref()),
                    ROOT_ELEMENT
                )));
            }
            Ok(Event::Eof) => return Err(Error::decode("document has no root element")),
            Ok(_) => continue,
            Err(e) => return Err(Error::decode(e.to_string())),
        }
    }
}

/// Boolean attribute with the lenient spellings the metadata service may emit
fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid boolean attribute value '{}'", raw))
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim() {
        "" => Some(false),
        "1" | "t" | "T" | "true" | "True" | "TRUE" => Some(true),
        "0" | "f" | "F" | "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}
