//! Format encoders: turn a fetched payload into a complete HTTP response.
//!
//! An encoder either returns a fully assembled response (status, headers and
//! body) or an [`EncodeError`]; nothing reaches the client until encoding has
//! succeeded, so a failure never leaves a half-written response behind.
//!
//! Payloads are opaque. JSON and XML carry them as base64 text, CSV and raw
//! pass the bytes through (CSV normalizes record terminators).

use std::io;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use http::StatusCode;
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use objgate_core::EncoderOptions;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};

use crate::body::GatewayBody;
use crate::params::QueryParams;

/// Errors raised while encoding a payload.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// Writing the serialized document failed.
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
    /// JSON serialization failed.
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    /// A header value could not be represented (e.g. a file name with
    /// control characters).
    #[error("invalid response: {0}")]
    Http(#[from] http::Error),
}

/// Serialize a payload into a response in one wire format.
pub trait Encode {
    /// Build the response for `payload`, fetched as `file_name`.
    fn encode(
        &self,
        payload: Bytes,
        params: &QueryParams,
        file_name: &str,
    ) -> Result<http::Response<GatewayBody>, EncodeError>;
}

/// The set of supported formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoder {
    /// JSON, or JSONP when a `callback` parameter is present.
    Json(JsonEncoder),
    /// XML document with declaration.
    Xml(XmlEncoder),
    /// CSV attachment.
    Csv(CsvEncoder),
    /// Bytes as stored.
    Raw(RawEncoder),
}

impl Encoder {
    /// Short format name, used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Json(_) => "json",
            Self::Xml(_) => "xml",
            Self::Csv(_) => "csv",
            Self::Raw(_) => "raw",
        }
    }

    /// All formats configured from `options`, keyed by their route prefix.
    #[must_use]
    pub fn standard_set(
        options: &EncoderOptions,
        file_content_type: &str,
    ) -> Vec<(&'static str, Self)> {
        vec![
            ("/csv/", Self::Csv(CsvEncoder { crlf: options.csv_crlf })),
            ("/xml/", Self::Xml(XmlEncoder { indent: options.xml_indent })),
            ("/json/", Self::Json(JsonEncoder { indent: options.json_indent })),
            (
                "/raw/",
                Self::Raw(RawEncoder {
                    content_type: file_content_type.to_owned(),
                }),
            ),
        ]
    }
}

impl Encode for Encoder {
    fn encode(
        &self,
        payload: Bytes,
        params: &QueryParams,
        file_name: &str,
    ) -> Result<http::Response<GatewayBody>, EncodeError> {
        match self {
            Self::Json(e) => e.encode(payload, params, file_name),
            Self::Xml(e) => e.encode(payload, params, file_name),
            Self::Csv(e) => e.encode(payload, params, file_name),
            Self::Raw(e) => e.encode(payload, params, file_name),
        }
    }
}

// ---------------------------------------------------------------------------
// JSON / JSONP
// ---------------------------------------------------------------------------

/// JSON encoder. The payload is serialized as a base64 JSON string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonEncoder {
    /// Pretty-print the document.
    pub indent: bool,
}

impl JsonEncoder {
    /// Query parameter naming the JSONP function.
    pub const CALLBACK_PARAM: &'static str = "callback";

    fn serialize(&self, payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let text = STANDARD.encode(payload);
        let json = if self.indent {
            serde_json::to_vec_pretty(&text)?
        } else {
            serde_json::to_vec(&text)?
        };
        Ok(json)
    }
}

impl Encode for JsonEncoder {
    fn encode(
        &self,
        payload: Bytes,
        params: &QueryParams,
        _file_name: &str,
    ) -> Result<http::Response<GatewayBody>, EncodeError> {
        let json = self.serialize(&payload)?;

        let (content_type, body) = match params.non_empty(Self::CALLBACK_PARAM) {
            Some(callback) => {
                let mut body = Vec::with_capacity(callback.len() + json.len() + 3);
                body.extend_from_slice(callback.as_bytes());
                body.push(b'(');
                body.extend_from_slice(&json);
                body.extend_from_slice(b");");
                ("application/javascript", body)
            }
            None => ("application/json", json),
        };

        let response = http::Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, content_type)
            .body(GatewayBody::from_bytes(body))?;
        Ok(response)
    }
}

// ---------------------------------------------------------------------------
// XML
// ---------------------------------------------------------------------------

/// XML encoder.
///
/// Produces `<Object>` with the file name, payload size and the payload as
/// base64 text:
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <Object>
///     <Key>report.csv</Key>
///     <Size>11</Size>
///     <Content encoding="base64">aGVsbG8gd29ybGQ=</Content>
/// </Object>
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XmlEncoder {
    /// Indent child elements with tabs.
    pub indent: bool,
}

impl XmlEncoder {
    fn document(&self, payload: &[u8], file_name: &str) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(payload.len() * 4 / 3 + 128);
        let mut writer = if self.indent {
            Writer::new_with_indent(&mut buf, b'\t', 1)
        } else {
            Writer::new(&mut buf)
        };

        // The body is only written once the declaration made it out.
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let size = payload.len().to_string();
        let content = STANDARD.encode(payload);
        writer.create_element("Object").write_inner_content(|w| {
            w.create_element("Key")
                .write_text_content(BytesText::new(file_name))?;
            w.create_element("Size")
                .write_text_content(BytesText::new(&size))?;
            w.create_element("Content")
                .with_attribute(("encoding", "base64"))
                .write_text_content(BytesText::new(&content))?;
            Ok(())
        })?;

        Ok(buf)
    }
}

impl Encode for XmlEncoder {
    fn encode(
        &self,
        payload: Bytes,
        _params: &QueryParams,
        file_name: &str,
    ) -> Result<http::Response<GatewayBody>, EncodeError> {
        let document = self.document(&payload, file_name)?;
        let response = http::Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "application/xml")
            .body(GatewayBody::from_bytes(document))?;
        Ok(response)
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// CSV encoder. Serves the payload as an attachment with every record
/// terminated by the configured line ending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvEncoder {
    /// Terminate records with `\r\n` instead of `\n`.
    pub crlf: bool,
}

impl Default for CsvEncoder {
    fn default() -> Self {
        Self { crlf: true }
    }
}

impl CsvEncoder {
    fn line_ending(self) -> &'static [u8] {
        if self.crlf { b"\r\n" } else { b"\n" }
    }

    /// Rewrite record terminators to the configured line ending.
    ///
    /// Line breaks inside quoted fields belong to the field and are kept.
    /// A final record without a terminator gets one; an empty payload stays
    /// empty.
    fn normalize(self, payload: &[u8]) -> Vec<u8> {
        let ending = self.line_ending();
        let mut out = Vec::with_capacity(payload.len() + payload.len() / 16);
        let mut in_quotes = false;
        let mut record_open = false;
        let mut i = 0;

        while i < payload.len() {
            let b = payload[i];
            match b {
                b'"' => {
                    in_quotes = !in_quotes;
                    out.push(b);
                    record_open = true;
                }
                b'\r' if !in_quotes && payload.get(i + 1) == Some(&b'\n') => {
                    out.extend_from_slice(ending);
                    record_open = false;
                    i += 1;
                }
                b'\n' if !in_quotes => {
                    out.extend_from_slice(ending);
                    record_open = false;
                }
                _ => {
                    out.push(b);
                    record_open = true;
                }
            }
            i += 1;
        }

        if record_open {
            out.extend_from_slice(ending);
        }
        out
    }
}

impl Encode for CsvEncoder {
    fn encode(
        &self,
        payload: Bytes,
        _params: &QueryParams,
        file_name: &str,
    ) -> Result<http::Response<GatewayBody>, EncodeError> {
        let body = self.normalize(&payload);
        let response = http::Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, mime::TEXT_CSV.as_ref())
            .header(CONTENT_DISPOSITION, format!("attachment;filename={file_name}"))
            .body(GatewayBody::from_bytes(body))?;
        Ok(response)
    }
}

// ---------------------------------------------------------------------------
// Raw
// ---------------------------------------------------------------------------

/// Passthrough encoder: bytes as stored, under a fixed content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEncoder {
    /// Content type sent with every object.
    pub content_type: String,
}

impl Default for RawEncoder {
    fn default() -> Self {
        Self {
            content_type: mime::APPLICATION_OCTET_STREAM.to_string(),
        }
    }
}

impl Encode for RawEncoder {
    fn encode(
        &self,
        payload: Bytes,
        _params: &QueryParams,
        _file_name: &str,
    ) -> Result<http::Response<GatewayBody>, EncodeError> {
        let response = http::Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, self.content_type.as_str())
            .body(GatewayBody::from_bytes(payload))?;
        Ok(response)
    }
}
