//! Content type to file extension mapping.

/// Known content types and the extension used when saving them.
pub const EXTENSION_TABLE: [(&str, &str); 3] = [
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
];

/// Maps a declared `Content-Type` to a file extension.
///
/// By default lookups are exact: `image/png; charset=binary` or `IMAGE/PNG`
/// are unsupported. With normalization enabled, parameters after `;` are
/// dropped and the media type is trimmed and lowercased first.
///
/// ```rust
/// use imgfetch::download::ExtensionResolver;
///
/// let exact = ExtensionResolver::new(false);
/// assert_eq!(exact.resolve(Some("image/jpeg")), Some("jpg"));
/// assert_eq!(exact.resolve(Some("image/jpeg; charset=binary")), None);
///
/// let lenient = ExtensionResolver::new(true);
/// assert_eq!(lenient.resolve(Some("Image/JPEG; charset=binary")), Some("jpg"));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtensionResolver {
    normalize: bool,
}

impl ExtensionResolver {
    pub fn new(normalize: bool) -> Self {
        Self { normalize }
    }

    /// Whether parameters and case are ignored.
    pub fn normalizes(&self) -> bool {
        self.normalize
    }

    /// Returns the extension for `content_type`, or `None` when it is absent
    /// or unsupported.
    pub fn resolve(&self, content_type: Option<&str>) -> Option<&'static str> {
        let content_type = content_type?;
        if self.normalize {
            let media_type = content_type
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();
            lookup(&media_type)
        } else {
            lookup(content_type)
        }
    }
}

fn lookup(content_type: &str) -> Option<&'static str> {
    EXTENSION_TABLE
        .iter()
        .find(|(known, _)| *known == content_type)
        .map(|(_, ext)| *ext)
}
