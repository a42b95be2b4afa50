use crate::http::{Body, Cookie, Headers};

/// Parts shared by requests and responses.
pub trait Entity {
    fn headers(&self) -> &Headers;

    fn headers_mut(&mut self) -> &mut Headers;

    fn body(&self) -> Option<&Body>;

    fn cookies(&self) -> &[Cookie];

    /// First cookie with the given name.
    fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies().iter().find(|c| c.name == name)
    }
}
