//! Detail tags: the labeled blocks under a description ("Since:", "See Also:").

/// One labeled block of extra information, in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTag {
    /// The tag label as printed on the page, e.g. `Since:`
    pub label: String,
    /// Plain text of the block
    pub text: String,
    /// Raw markup of the block
    pub html: String,
}

impl DetailTag {
    /// Create a detail tag.
    pub fn new(
        label: impl Into<String>,
        text: impl Into<String>,
        html: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
            html: html.into(),
        }
    }
}
