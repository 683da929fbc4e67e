use super::BytesRejection;
use crate::Request;
use crate::body::util::BodyExt;
use crate::service::web::extract::FromRequest;
use crate::utils::macros::{composite_http_rejection, define_http_rejection};
use rama_utils::macros::impl_deref;

/// Extractor to get the response body, collected as [`String`].
#[derive(Debug, Clone)]
pub struct Text(pub String);

impl_deref!(Text: String);

define_http_rejection! {
    #[status = UNSUPPORTED_MEDIA_TYPE]
    #[body = "Text requests must have `Content-Type: text/plain`"]
    /// Rejection type for [`Text`]
    /// used if the `Content-Type` header is missing
    /// or its value is not `text/plain`.
    pub struct InvalidTextContentType;
}

define_http_rejection! {
    #[status = BAD_REQUEST]
    #[body = "Failed to decode text payload"]
    /// Rejection type used if the [`Text`]
    /// was not valid UTF-8.
    pub struct InvalidUtf8Text(Error);
}

composite_http_rejection! {
    /// Rejection used for [`Text`]
    ///
    /// Contains one variant for each way the [`Text`] extractor
    /// can fail.
    pub enum TextRejection {
        InvalidTextContentType,
        InvalidUtf8Text,
        BytesRejection,
    }
}

impl FromRequest for Text {
    type Rejection = TextRejection;

    async fn from_request(req: Request) -> Result<Self, Self::Rejection> {
        if !crate::service::web::extract::has_any_content_type(req.headers(), &[&mime::TEXT_PLAIN])
        {
            return Err(InvalidTextContentType.into());
        }

        let body = req.into_body();
        match body.collect().await {
            Ok(c) => match String::from_utf8(c.to_bytes().to_vec()) {
                Ok(s) => Ok(Self(s)),
                Err(err) => Err(InvalidUtf8Text::from_err(err).into()),
            },
            Err(err) => Err(BytesRejection::from_err(err).into()),
        }
    }
}
