// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document metadata for the output: merge of source information with user
// overrides, and its two serialisations (the `/Info` dictionary and an XMP
// packet).

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, TimeZone};
use kopierwerk_core::types::{MetadataField, MetadataOverrides, MetadataSet};
use lopdf::Dictionary;
use tracing::debug;
use uuid::Uuid;

use crate::pdf::text::{encode_text_string, pdf_date};

/// Producer string written into every output.
pub fn producer() -> String {
    format!("kopierwerk {}", env!("CARGO_PKG_VERSION"))
}

/// Combines the source document's information map with the user's overrides.
pub struct MetadataMerger;

impl MetadataMerger {
    /// For each field: the override if given, else a non-empty source value,
    /// else nothing. Overrides are written back into `source` as well.
    pub fn merge(
        source: &mut BTreeMap<String, String>,
        overrides: &MetadataOverrides,
    ) -> MetadataSet {
        let mut merged = MetadataSet::new();
        for field in MetadataField::ALL {
            let key = field.info_key();
            if let Some(value) = overrides.get(field) {
                source.insert(key.to_string(), value.to_string());
                merged.set(field, value);
            } else if let Some(value) = source.get(key).filter(|value| !value.is_empty()) {
                merged.set(field, value.clone());
            }
        }
        debug!(fields = merged.len(), "Metadata merged");
        merged
    }
}

/// The `/Info` dictionary for `metadata`, stamped with producer and dates.
pub fn info_dictionary<Tz: TimeZone>(metadata: &MetadataSet, now: &DateTime<Tz>) -> Dictionary {
    let mut info = Dictionary::new();
    for (field, value) in metadata.iter() {
        info.set(field.info_key(), encode_text_string(value));
    }
    let date = pdf_date(now);
    info.set("Producer", encode_text_string(&producer()));
    info.set("CreationDate", encode_text_string(&date));
    info.set("ModDate", encode_text_string(&date));
    info
}

/// An XMP packet mirroring the `/Info` dictionary.
pub fn xmp_packet<Tz: TimeZone>(metadata: &MetadataSet, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Secs, false);
    let document_id = Uuid::new_v4();
    let instance_id = Uuid::new_v4();

    let mut properties = String::new();
    properties.push_str("      <dc:format>application/pdf</dc:format>\n");
    if let Some(title) = metadata.get(MetadataField::Title) {
        properties.push_str(&format!(
            "      <dc:title><rdf:Alt><rdf:li xml:lang=\"x-default\">{}</rdf:li></rdf:Alt></dc:title>\n",
            escape_xml(title)
        ));
    }
    if let Some(author) = metadata.get(MetadataField::Author) {
        properties.push_str(&format!(
            "      <dc:creator><rdf:Seq><rdf:li>{}</rdf:li></rdf:Seq></dc:creator>\n",
            escape_xml(author)
        ));
    }
    if let Some(subject) = metadata.get(MetadataField::Subject) {
        properties.push_str(&format!(
            "      <dc:description><rdf:Alt><rdf:li xml:lang=\"x-default\">{}</rdf:li></rdf:Alt></dc:description>\n",
            escape_xml(subject)
        ));
    }
    if let Some(keywords) = metadata.get(MetadataField::Keywords) {
        properties.push_str(&format!(
            "      <pdf:Keywords>{}</pdf:Keywords>\n",
            escape_xml(keywords)
        ));
    }
    if let Some(creator) = metadata.get(MetadataField::Creator) {
        properties.push_str(&format!(
            "      <xmp:CreatorTool>{}</xmp:CreatorTool>\n",
            escape_xml(creator)
        ));
    }

    format!(
        "<?xpacket begin=\"\u{feff}\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>\n\
         <x:xmpmeta xmlns:x=\"adobe:ns:meta/\">\n\
         \x20 <rdf:RDF xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\">\n\
         \x20   <rdf:Description rdf:about=\"\"\n\
         \x20       xmlns:dc=\"http://purl.org/dc/elements/1.1/\"\n\
         \x20       xmlns:pdf=\"http://ns.adobe.com/pdf/1.3/\"\n\
         \x20       xmlns:xmp=\"http://ns.adobe.com/xap/1.0/\"\n\
         \x20       xmlns:xmpMM=\"http://ns.adobe.com/xap/1.0/mm/\">\n\
         {properties}\
         \x20     <pdf:Producer>{producer}</pdf:Producer>\n\
         \x20     <xmp:CreateDate>{timestamp}</xmp:CreateDate>\n\
         \x20     <xmp:ModifyDate>{timestamp}</xmp:ModifyDate>\n\
         \x20     <xmp:MetadataDate>{timestamp}</xmp:MetadataDate>\n\
         \x20     <xmpMM:DocumentID>uuid:{document_id}</xmpMM:DocumentID>\n\
         \x20     <xmpMM:InstanceID>uuid:{instance_id}</xmpMM:InstanceID>\n\
         \x20   </rdf:Description>\n\
         \x20 </rdf:RDF>\n\
         </x:xmpmeta>\n\
         <?xpacket end=\"w\"?>",
        producer = escape_xml(&producer()),
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, Utc};

    use super::*;
    use crate::pdf::text::decode_text_string;

    fn source_info(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn override_beats_source() {
        let mut source = source_info(&[("Title", "Original"), ("Author", "Alice")]);
        let overrides = MetadataOverrides {
            title: Some("Copy for review".into()),
            ..Default::default()
        };
        let merged = MetadataMerger::merge(&mut source, &overrides);
        assert_eq!(merged.get(MetadataField::Title), Some("Copy for review"));
        assert_eq!(merged.get(MetadataField::Author), Some("Alice"));
        assert_eq!(source["Title"], "Copy for review");
    }

    #[test]
    fn empty_source_values_are_omitted() {
        let mut source = source_info(&[("Subject", ""), ("Keywords", "alpha, beta")]);
        let merged = MetadataMerger::merge(&mut source, &MetadataOverrides::default());
        assert_eq!(merged.get(MetadataField::Subject), None);
        assert_eq!(merged.get(MetadataField::Keywords), Some("alpha, beta"));
        assert_eq!(merged.get(MetadataField::Creator), None);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn unrelated_source_keys_are_ignored() {
        let mut source = source_info(&[("Trapped", "False"), ("Producer", "Other")]);
        let merged = MetadataMerger::merge(&mut source, &MetadataOverrides::default());
        assert!(merged.is_empty());
    }

    #[test]
    fn info_dictionary_has_fields_and_dates() {
        let mut metadata = MetadataSet::new();
        metadata.set(MetadataField::Title, "Prüfbericht");
        let now = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 19, 8, 0, 0)
            .unwrap();
        let info = info_dictionary(&metadata, &now);

        let title = info.get(b"Title").unwrap().as_str().unwrap();
        assert_eq!(decode_text_string(title), "Prüfbericht");
        assert!(!info.has(b"Author"));
        let created = info.get(b"CreationDate").unwrap().as_str().unwrap();
        assert_eq!(created, b"D:20261019080000+01'00'");
        let producer_bytes = info.get(b"Producer").unwrap().as_str().unwrap();
        assert!(decode_text_string(producer_bytes).starts_with("kopierwerk "));
    }

    #[test]
    fn xmp_escapes_and_mirrors_fields() {
        let mut metadata = MetadataSet::new();
        metadata.set(MetadataField::Title, "R&D <draft>");
        metadata.set(MetadataField::Author, "Ops");
        let packet = xmp_packet(&metadata, &Utc::now());
        assert!(packet.starts_with("<?xpacket begin="));
        assert!(packet.ends_with("<?xpacket end=\"w\"?>"));
        assert!(packet.contains("R&amp;D &lt;draft&gt;"));
        assert!(packet.contains("<rdf:li>Ops</rdf:li>"));
        assert!(packet.contains("<xmpMM:DocumentID>uuid:"));
        assert!(!packet.contains("pdf:Keywords"));
    }

    #[test]
    fn xmp_ids_are_unique_per_packet() {
        let metadata = MetadataSet::new();
        let first = xmp_packet(&metadata, &Utc::now());
        let second = xmp_packet(&metadata, &Utc::now());
        let id = |packet: &str| {
            packet
                .lines()
                .find(|line| line.contains("DocumentID"))
                .map(str::to_string)
        };
        assert_ne!(id(&first), id(&second));
    }
}
