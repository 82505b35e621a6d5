//! Profile photo uploads.

use chrono::{DateTime, Utc};
use url::Url;

use super::ids::UserId;

/// Storage bucket holding profile photos.
pub const AVATAR_BUCKET: &str = "avatars";
/// Largest accepted upload (5 MiB).
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

/// Reasons an upload is refused before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AvatarValidationError {
    /// Nothing was uploaded.
    #[error("choose an image to upload")]
    Empty,
    /// Content type is not `image/*`.
    #[error("Please select an image file.")]
    NotAnImage,
    /// Over [`MAX_AVATAR_BYTES`].
    #[error("Image must be under 5MB.")]
    TooLarge,
}

/// A validated photo upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarUpload {
    content_type: String,
    extension: String,
    bytes: Vec<u8>,
}

impl AvatarUpload {
    /// Check the declared type and size of an upload.
    ///
    /// The extension is taken from the text after the file name's last dot,
    /// or the whole name when it has none.
    ///
    /// # Examples
    /// ```
    /// use husky_helpers::domain::avatar::AvatarUpload;
    ///
    /// let upload = AvatarUpload::new("me.PNG", "image/png", vec![1, 2, 3]).unwrap();
    /// assert_eq!(upload.extension(), "PNG");
    /// assert!(AvatarUpload::new("notes.txt", "text/plain", vec![1]).is_err());
    /// ```
    pub fn new(
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Self, AvatarValidationError> {
        if bytes.is_empty() {
            return Err(AvatarValidationError::Empty);
        }
        if !content_type.trim().to_ascii_lowercase().starts_with("image/") {
            return Err(AvatarValidationError::NotAnImage);
        }
        if bytes.len() > MAX_AVATAR_BYTES {
            return Err(AvatarValidationError::TooLarge);
        }
        let extension = file_name.rsplit('.').next().unwrap_or(file_name);
        Ok(Self {
            content_type: content_type.trim().to_owned(),
            extension: extension.to_owned(),
            bytes,
        })
    }

    /// Declared MIME type.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.content_type.as_str()
    }

    /// File extension without the dot.
    #[must_use]
    pub fn extension(&self) -> &str {
        self.extension.as_str()
    }

    /// Raw image bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    /// Consume the upload, yielding its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Object path: `<user_id>/avatar.<ext>`. Re-uploads overwrite it.
    #[must_use]
    pub fn object_path(&self, owner: UserId) -> String {
        format!("{owner}/avatar.{}", self.extension)
    }
}

/// Append `t=<unix millis>` so browsers refetch an overwritten object.
#[must_use]
pub fn cache_busted_url(public_url: &Url, now: DateTime<Utc>) -> Url {
    let mut url = public_url.clone();
    url.query_pairs_mut()
        .append_pair("t", &now.timestamp_millis().to_string());
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case("avatar.jpeg", "jpeg")]
    #[case("holiday.photo.png", "png")]
    #[case("noext", "noext")]
    fn extension_follows_last_dot(#[case] name: &str, #[case] expected: &str) {
        let upload = AvatarUpload::new(name, "image/jpeg", vec![0]).expect("valid");
        assert_eq!(upload.extension(), expected);
    }

    #[rstest]
    #[case("text/plain", vec![0], AvatarValidationError::NotAnImage)]
    #[case("image/png", vec![], AvatarValidationError::Empty)]
    #[case("image/png", vec![0; MAX_AVATAR_BYTES + 1], AvatarValidationError::TooLarge)]
    fn rejects_bad_uploads(
        #[case] content_type: &str,
        #[case] bytes: Vec<u8>,
        #[case] expected: AvatarValidationError,
    ) {
        assert_eq!(AvatarUpload::new("a.png", content_type, bytes), Err(expected));
    }

    #[rstest]
    fn exactly_five_mebibytes_is_accepted() {
        assert!(AvatarUpload::new("a.png", "image/png", vec![0; MAX_AVATAR_BYTES]).is_ok());
    }

    #[rstest]
    fn path_is_scoped_to_owner() {
        let owner: UserId = "3f2c8a52-7d4e-4c1b-9a51-0f6d9e2b7c11".parse().expect("uuid");
        let upload = AvatarUpload::new("me.webp", "image/webp", vec![1]).expect("valid");
        assert_eq!(
            upload.object_path(owner),
            "3f2c8a52-7d4e-4c1b-9a51-0f6d9e2b7c11/avatar.webp"
        );
    }

    #[rstest]
    fn cache_buster_uses_millis() {
        let url = Url::parse("https://x.supabase.co/storage/v1/object/public/avatars/u/avatar.png")
            .expect("url");
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).single().expect("time");
        assert_eq!(
            cache_busted_url(&url, now).as_str(),
            "https://x.supabase.co/storage/v1/object/public/avatars/u/avatar.png?t=1700000000123"
        );
    }
}
