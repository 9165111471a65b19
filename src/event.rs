//! Parse events handed from the streaming XML tokenizer to the reducers.
//!
//! The reducers never see the tokenizer itself. [`drive`] pulls events off an
//! `xml-rs` reader and hands each one to a [`FeedHandler`] in document order.

use std::io::{BufReader, Read};

use xml::reader::{EventReader, XmlEvent};

use crate::error::DecodeError;

/// Attribute list of one element, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Owned copy of an attribute, the form the reducers keep in scratch state.
    pub fn value(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_string)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Attributes(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseEvent {
    ElementStart { name: String, attributes: Attributes },
    Text(String),
    ElementEnd { name: String },
    DocumentEnd,
}

impl ParseEvent {
    pub fn start<K, V>(name: &str, attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        ParseEvent::ElementStart {
            name: name.to_string(),
            attributes: attributes.into_iter().collect(),
        }
    }

    pub fn end(name: &str) -> Self {
        ParseEvent::ElementEnd {
            name: name.to_string(),
        }
    }

    pub fn text(text: &str) -> Self {
        ParseEvent::Text(text.to_string())
    }

    fn from_xml(event: XmlEvent) -> Option<Self> {
        match event {
            XmlEvent::StartElement {
                name, attributes, ..
            } => Some(ParseEvent::ElementStart {
                name: name.local_name,
                attributes: attributes
                    .into_iter()
                    .map(|a| (a.name.local_name, a.value))
                    .collect(),
            }),
            XmlEvent::EndElement { name } => Some(ParseEvent::ElementEnd {
                name: name.local_name,
            }),
            XmlEvent::Characters(text) | XmlEvent::CData(text) => Some(ParseEvent::Text(text)),
            XmlEvent::EndDocument => Some(ParseEvent::DocumentEnd),
            _ => None,
        }
    }
}

/// A reducer fed one parse event at a time.
pub trait FeedHandler {
    fn handle(&mut self, event: ParseEvent) -> Result<(), DecodeError>;
}

/// Streams `source` through the XML tokenizer into `handler`.
///
/// The tokenizer reads a byte at a time, so `source` is buffered here and
/// callers hand over unbuffered readers such as an HTTP body. Returns once the document end has been delivered, or at the first
/// tokenizer or handler error.
pub fn drive<R: Read, H: FeedHandler + ?Sized>(source: R, handler: &mut H) -> Result<(), DecodeError> {
    for event in EventReader::new(BufReader::new(source)) {
        let event = event.map_err(|e| DecodeError::Markup(e.to_string()))?;
        if let Some(event) = ParseEvent::from_xml(event) {
            handler.handle(event)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<ParseEvent>);

    impl FeedHandler for Recorder {
        fn handle(&mut self, event: ParseEvent) -> Result<(), DecodeError> {
            self.0.push(event);
            Ok(())
        }
    }

    #[test]
    fn test_drive_emits_events_in_order() {
        let xml = r#"<current><city id="5128581" name="New York"><country>US</country></city></current>"#;
        let mut recorder = Recorder::default();
        drive(xml.as_bytes(), &mut recorder).unwrap();

        assert_eq!(
            recorder.0,
            vec![
                ParseEvent::start("current", Vec::<(&str, &str)>::new()),
                ParseEvent::start("city", [("id", "5128581"), ("name", "New York")]),
                ParseEvent::start("country", Vec::<(&str, &str)>::new()),
                ParseEvent::text("US"),
                ParseEvent::end("country"),
                ParseEvent::end("city"),
                ParseEvent::end("current"),
                ParseEvent::DocumentEnd,
            ]
        );
    }

    #[test]
    fn test_drive_reports_malformed_markup() {
        let mut recorder = Recorder::default();
        let err = drive("<current><city></current>".as_bytes(), &mut recorder).unwrap_err();
        assert!(matches!(err, DecodeError::Markup(_)));
    }

    struct CountingReader<'a> {
        inner: &'a [u8],
        reads: usize,
    }

    impl Read for CountingReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.reads += 1;
            self.inner.read(buf)
        }
    }

    #[test]
    fn test_drive_buffers_the_source() {
        let mut xml = String::from("<weatherdata><forecast>");
        for hour in 0..24 {
            xml.push_str(&format!(
                r#"<time from="2024-03-10T{hour:02}:00:00"><humidity value="60" unit="%"/></time>"#
            ));
        }
        xml.push_str("</forecast></weatherdata>");

        let mut source = CountingReader {
            inner: xml.as_bytes(),
            reads: 0,
        };
        let mut recorder = Recorder::default();
        drive(&mut source, &mut recorder).unwrap();

        assert_eq!(recorder.0.last(), Some(&ParseEvent::DocumentEnd));
        assert!(xml.len() > 1000);
        assert!(source.reads < 10, "{} reads for {} bytes", source.reads, xml.len());
    }

    #[test]
    fn test_attribute_lookup() {
        let attributes: Attributes = [("value", "12.5"), ("unit", "fahrenheit")]
            .into_iter()
            .collect();
        assert_eq!(attributes.get("unit"), Some("fahrenheit"));
        assert_eq!(attributes.value("value"), Some("12.5".to_string()));
        assert_eq!(attributes.get("min"), None);
    }
}
