//! DIDL-Lite playback-description documents sent as `CurrentURIMetaData`.
//!
//! Only encoding lives here. Documents coming back from a device are handed
//! to callers untouched.
//!
//! Encoded document shape:
//! ```xml
//! <DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/"
//!            xmlns:dc="http://purl.org/dc/elements/1.1/"
//!            xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/"
//!            xmlns:sec="http://www.sec.co.kr/">
//!   <item id="0" parentID="-1" restricted="false">
//!     <upnp:class>object.item.videoItem.movie</upnp:class>
//!     <dc:title>Title</dc:title>
//!     <dc:creator>Creator</dc:creator>
//!     <res protocolInfo="http-get:*:video/mp4:*">http://host/movie.mp4</res>
//!     <sec:CaptionInfo sec:type="srt">http://host/movie.srt</sec:CaptionInfo>
//!     <sec:CaptionInfoEx sec:type="srt">http://host/movie.srt</sec:CaptionInfoEx>
//!     <res protocolInfo="http-get:*:text/srt:*">http://host/movie.srt</res>
//!   </item>
//! </DIDL-Lite>
//! ```

use std::error::Error as StdError;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{RendererError, Result};

const DIDL_NAMESPACE: &str = "urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/";
const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";
const UPNP_NAMESPACE: &str = "urn:schemas-upnp-org:metadata-1-0/upnp/";
const SEC_NAMESPACE: &str = "http://www.sec.co.kr/";

/// Protocol info of the extra resource that carries SRT subtitles
pub const SRT_PROTOCOL_INFO: &str = "http-get:*:text/srt:*";

/// Kind of media item, mapped to a UPnP object class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Audio,
    Video,
    Image,
}

impl MediaType {
    /// Look up a media type by its lowercase name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "audio" => Some(Self::Audio),
            "video" => Some(Self::Video),
            "image" => Some(Self::Image),
            _ => None,
        }
    }

    /// The `upnp:class` value for this media type
    pub fn upnp_class(&self) -> &'static str {
        match self {
            Self::Audio => "object.item.audioItem.musicTrack",
            Self::Video => "object.item.videoItem.movie",
            Self::Image => "object.item.imageItem.photo",
        }
    }
}

/// Description of the media item being loaded
///
/// Every field is optional. A primary resource element is only written when
/// both `url` and `protocol_info` are present; empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Metadata {
    /// Item kind; unknown names deserialize to `None`
    #[serde(rename = "type", deserialize_with = "lenient_media_type")]
    pub media_type: Option<MediaType>,
    pub title: Option<String>,
    pub creator: Option<String>,
    pub url: Option<String>,
    pub protocol_info: Option<String>,
    pub subtitles_url: Option<String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    pub fn with_resource(mut self, url: impl Into<String>, protocol_info: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self.protocol_info = Some(protocol_info.into());
        self
    }

    pub fn with_subtitles(mut self, url: impl Into<String>) -> Self {
        self.subtitles_url = Some(url.into());
        self
    }

    /// Encode this description; see [`encode_metadata`]
    pub fn to_didl(&self) -> Result<String> {
        encode_metadata(self)
    }
}

/// Encode `metadata` as a compact single-item DIDL-Lite document without an
/// XML declaration
pub fn encode_metadata(metadata: &Metadata) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    write_document(&mut writer, metadata)
        .map_err(|e| RendererError::MetadataEncoding(e.to_string()))?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| RendererError::MetadataEncoding(e.to_string()))
}

type WriteResult = std::result::Result<(), Box<dyn StdError + Send + Sync>>;

fn write_document(writer: &mut Writer<Vec<u8>>, metadata: &Metadata) -> WriteResult {
    writer.write_event(Event::Start(BytesStart::new("DIDL-Lite").with_attributes([
        ("xmlns", DIDL_NAMESPACE),
        ("xmlns:dc", DC_NAMESPACE),
        ("xmlns:upnp", UPNP_NAMESPACE),
        ("xmlns:sec", SEC_NAMESPACE),
    ])))?;

    // Ad-hoc item: never a persistent content-directory entry
    writer.write_event(Event::Start(BytesStart::new("item").with_attributes([
        ("id", "0"),
        ("parentID", "-1"),
        ("restricted", "false"),
    ])))?;

    if let Some(media_type) = metadata.media_type {
        write_text_element(writer, BytesStart::new("upnp:class"), media_type.upnp_class())?;
    }
    if let Some(title) = present(&metadata.title) {
        write_text_element(writer, BytesStart::new("dc:title"), title)?;
    }
    if let Some(creator) = present(&metadata.creator) {
        write_text_element(writer, BytesStart::new("dc:creator"), creator)?;
    }
    if let (Some(url), Some(protocol_info)) = (present(&metadata.url), present(&metadata.protocol_info)) {
        write_text_element(
            writer,
            BytesStart::new("res").with_attributes([("protocolInfo", protocol_info)]),
            url,
        )?;
    }
    if let Some(subtitles) = present(&metadata.subtitles_url) {
        write_text_element(
            writer,
            BytesStart::new("sec:CaptionInfo").with_attributes([("sec:type", "srt")]),
            subtitles,
        )?;
        write_text_element(
            writer,
            BytesStart::new("sec:CaptionInfoEx").with_attributes([("sec:type", "srt")]),
            subtitles,
        )?;
        write_text_element(
            writer,
            BytesStart::new("res").with_attributes([("protocolInfo", SRT_PROTOCOL_INFO)]),
            subtitles,
        )?;
    }

    writer.write_event(Event::End(BytesEnd::new("item")))?;
    writer.write_event(Event::End(BytesEnd::new("DIDL-Lite")))?;
    Ok(())
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, start: BytesStart<'_>, text: &str) -> WriteResult {
    let end = start.to_end().into_owned();
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(end))?;
    Ok(())
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn lenient_media_type<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<MediaType>, D::Error> {
    let name = Option::<String>::deserialize(deserializer)?;
    Ok(name.as_deref().and_then(MediaType::from_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmltree::{Element, XMLNode};

    fn parse(document: &str) -> Element {
        Element::parse(document.as_bytes()).expect("encoded metadata must be well-formed XML")
    }

    fn item(root: &Element) -> &Element {
        root.get_child("item").expect("item element")
    }

    fn children<'a>(element: &'a Element, name: &str) -> Vec<&'a Element> {
        element
            .children
            .iter()
            .filter_map(|n| match n {
                XMLNode::Element(e) if e.name == name => Some(e),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_encode_video_item() {
        let metadata = Metadata::new()
            .with_type(MediaType::Video)
            .with_title("X")
            .with_resource("http://a/b", "http-get:*:video/mp4:*");

        let document = encode_metadata(&metadata).unwrap();
        assert!(!document.starts_with("<?xml"));

        let root = parse(&document);
        assert_eq!(root.name, "DIDL-Lite");
        let item = item(&root);

        let class = item.get_child("class").unwrap();
        assert_eq!(class.prefix.as_deref(), Some("upnp"));
        assert_eq!(class.get_text().unwrap(), "object.item.videoItem.movie");
        assert_eq!(item.get_child("title").unwrap().get_text().unwrap(), "X");
        assert!(item.get_child("creator").is_none());

        let resources = children(item, "res");
        assert_eq!(resources.len(), 1);
        assert_eq!(
            resources[0].attributes.get("protocolInfo").map(String::as_str),
            Some("http-get:*:video/mp4:*")
        );
        assert_eq!(resources[0].get_text().unwrap(), "http://a/b");
    }

    #[test]
    fn test_item_identity_and_namespaces() {
        let document = encode_metadata(&Metadata::new()).unwrap();
        assert!(document.starts_with(r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/" xmlns:sec="http://www.sec.co.kr/">"#));
        assert!(document.contains(r#"<item id="0" parentID="-1" restricted="false">"#));
        assert!(!document.contains('\n'));

        let root = parse(&document);
        assert!(item(&root).children.is_empty());
    }

    #[test]
    fn test_class_per_media_type() {
        for (media_type, class) in [
            (MediaType::Audio, "object.item.audioItem.musicTrack"),
            (MediaType::Video, "object.item.videoItem.movie"),
            (MediaType::Image, "object.item.imageItem.photo"),
        ] {
            let document = encode_metadata(&Metadata::new().with_type(media_type)).unwrap();
            let root = parse(&document);
            assert_eq!(item(&root).get_child("class").unwrap().get_text().unwrap(), class);
        }
    }

    #[test]
    fn test_resource_requires_url_and_protocol_info() {
        let only_url = Metadata {
            url: Some("http://a/b".to_string()),
            ..Metadata::default()
        };
        let root = parse(&encode_metadata(&only_url).unwrap());
        assert!(children(item(&root), "res").is_empty());

        let only_protocol = Metadata {
            protocol_info: Some("http-get:*:video/mp4:*".to_string()),
            ..Metadata::default()
        };
        let root = parse(&encode_metadata(&only_protocol).unwrap());
        assert!(children(item(&root), "res").is_empty());
    }

    #[test]
    fn test_subtitles_add_caption_info_and_second_resource() {
        let metadata = Metadata::new()
            .with_type(MediaType::Video)
            .with_creator("Director")
            .with_resource("http://a/movie.mp4", "http-get:*:video/mp4:*")
            .with_subtitles("http://a/movie.srt");

        let root = parse(&encode_metadata(&metadata).unwrap());
        let item = item(&root);

        assert_eq!(item.get_child("creator").unwrap().get_text().unwrap(), "Director");

        for name in ["CaptionInfo", "CaptionInfoEx"] {
            let caption = item.get_child(name).unwrap();
            assert_eq!(caption.prefix.as_deref(), Some("sec"));
            assert_eq!(caption.attributes.get("type").map(String::as_str), Some("srt"));
            assert_eq!(caption.get_text().unwrap(), "http://a/movie.srt");
        }

        let resources = children(item, "res");
        assert_eq!(resources.len(), 2);
        assert_eq!(
            resources[1].attributes.get("protocolInfo").map(String::as_str),
            Some(SRT_PROTOCOL_INFO)
        );
        assert_eq!(resources[1].get_text().unwrap(), "http://a/movie.srt");
    }

    #[test]
    fn test_text_and_attributes_are_escaped() {
        let metadata = Metadata::new()
            .with_title("Tom & Jerry <1>")
            .with_resource("http://a/b?x=1&y=2", "http-get:*:video/mp4:DLNA.ORG_OP=01");

        let document = encode_metadata(&metadata).unwrap();
        assert!(document.contains("Tom &amp; Jerry &lt;1&gt;"));

        let root = parse(&document);
        let item = item(&root);
        assert_eq!(item.get_child("title").unwrap().get_text().unwrap(), "Tom & Jerry <1>");
        assert_eq!(children(item, "res")[0].get_text().unwrap(), "http://a/b?x=1&y=2");
    }

    #[test]
    fn test_empty_strings_are_omitted() {
        let metadata = Metadata {
            title: Some(String::new()),
            creator: Some(String::new()),
            ..Metadata::default()
        };
        let root = parse(&encode_metadata(&metadata).unwrap());
        assert!(item(&root).children.is_empty());
    }

    #[test]
    fn test_unknown_type_deserializes_to_none() {
        let metadata: Metadata = serde_json::from_str(r#"{"type":"hologram","title":"T"}"#).unwrap();
        assert_eq!(metadata.media_type, None);

        let root = parse(&encode_metadata(&metadata).unwrap());
        assert!(item(&root).get_child("class").is_none());
    }

    #[test]
    fn test_deserialize_camel_case_fields() {
        let metadata: Metadata = serde_json::from_str(
            r#"{"type":"video","url":"http://a/b","protocolInfo":"http-get:*:video/mp4:*","subtitlesUrl":"http://a/b.srt"}"#,
        )
        .unwrap();
        assert_eq!(metadata.media_type, Some(MediaType::Video));
        assert_eq!(metadata.protocol_info.as_deref(), Some("http-get:*:video/mp4:*"));
        assert_eq!(metadata.subtitles_url.as_deref(), Some("http://a/b.srt"));
    }
}
