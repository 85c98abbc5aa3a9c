// Notification content: the two mutually exclusive rendering modes a platform
// can materialize.

use serde::{Deserialize, Serialize};
use url::Url;

use super::{NotificationError, NotificationResult};

/// What the platform should render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case", try_from = "RawContent")]
pub enum NotificationContent {
    /// HTML document loaded from a URL
    Document { url: String },
    /// Icon, title and text laid out by the platform
    Structured {
        icon: String,
        title: String,
        body: String,
    },
}

impl NotificationContent {
    /// Document content; `url` may be absolute or relative to the host page
    pub fn document(url: impl Into<String>) -> NotificationResult<Self> {
        let url = url.into();
        validate_document_url(&url)?;
        Ok(Self::Document { url })
    }

    pub fn structured(
        icon: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::Structured {
            icon: icon.into(),
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            NotificationContent::Document { .. } => "document",
            NotificationContent::Structured { .. } => "structured",
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self, NotificationContent::Document { .. })
    }
}

/// Wire form of [`NotificationContent`]; deserialized values are validated
/// through the same constructors callers use.
#[derive(Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
enum RawContent {
    Document { url: String },
    Structured {
        icon: String,
        title: String,
        body: String,
    },
}

impl TryFrom<RawContent> for NotificationContent {
    type Error = NotificationError;

    fn try_from(raw: RawContent) -> Result<Self, Self::Error> {
        match raw {
            RawContent::Document { url } => NotificationContent::document(url),
            RawContent::Structured { icon, title, body } => {
                Ok(NotificationContent::structured(icon, title, body))
            },
        }
    }
}

fn validate_document_url(url: &str) -> NotificationResult<()> {
    if url.trim().is_empty() {
        return Err(NotificationError::configuration(
            "url",
            "document url is empty",
        ));
    }

    match Url::parse(url) {
        Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => Ok(()),
        Err(e) => Err(NotificationError::configuration(
            "url",
            format!("malformed document url {url:?}: {e}"),
        )),
    }
}

/// Raw content description in option-bag form: either `url`, or any of
/// `icon`/`title`/`content`.
///
/// Converting into [`NotificationContent`] picks the mode from which fields are
/// present and rejects bags that name both modes or neither.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentFields {
    pub url: Option<String>,
    pub icon: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
}

impl ContentFields {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    fn has_structured_fields(&self) -> bool {
        self.icon.is_some() || self.title.is_some() || self.content.is_some()
    }
}

impl TryFrom<ContentFields> for NotificationContent {
    type Error = NotificationError;

    fn try_from(fields: ContentFields) -> Result<Self, Self::Error> {
        let structured = fields.has_structured_fields();
        match (fields.url, structured) {
            (Some(_), true) => Err(NotificationError::configuration(
                "content",
                "url cannot be combined with icon, title or content",
            )),
            (Some(url), false) => NotificationContent::document(url),
            (None, true) => Ok(NotificationContent::structured(
                fields.icon.unwrap_or_default(),
                fields.title.unwrap_or_default(),
                fields.content.unwrap_or_default(),
            )),
            (None, false) => Err(NotificationError::configuration(
                "content",
                "either url or icon/title/content must be supplied",
            )),
        }
    }
}
