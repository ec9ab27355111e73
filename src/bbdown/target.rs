use std::fmt;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("Please enter a video URL or ID!")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Url,
    Av,
    Bv,
    Ep,
    Ss,
    Other,
}

/// What the user typed into the identifier field, trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    text: String,
    kind: TargetKind,
}

impl Target {
    pub fn parse(input: &str) -> Result<Self, TargetError> {
        let text = input.trim();
        if text.is_empty() {
            return Err(TargetError::Empty);
        }

        Ok(Self {
            text: text.to_string(),
            kind: classify(text),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn classify(text: &str) -> TargetKind {
    if let Ok(url) = Url::parse(text) {
        if matches!(url.scheme(), "http" | "https") {
            return TargetKind::Url;
        }
    }

    let Some(prefix) = text.get(..2) else {
        return TargetKind::Other;
    };
    let body = &text[2..];
    if body.is_empty() {
        return TargetKind::Other;
    }

    let digits = body.chars().all(|c| c.is_ascii_digit());
    match prefix.to_ascii_lowercase().as_str() {
        "av" if digits => TargetKind::Av,
        "ep" if digits => TargetKind::Ep,
        "ss" if digits => TargetKind::Ss,
        "bv" if body.chars().all(|c| c.is_ascii_alphanumeric()) => TargetKind::Bv,
        _ => TargetKind::Other,
    }
}
