//! Clearable cookie jar
//!
//! `reqwest::cookie::Jar` can only grow. The session transport needs to
//! forget the session proof on logout, so it hands the client this wrapper
//! and swaps the inner jar for an empty one.

use parking_lot::RwLock;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use reqwest::Url;

#[derive(Debug, Default)]
pub struct SessionCookies {
    jar: RwLock<Jar>,
}

impl SessionCookies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every stored cookie.
    pub fn clear(&self) {
        *self.jar.write() = Jar::default();
    }

    /// `true` if a request to `url` would carry cookies.
    pub fn has_cookies_for(&self, url: &Url) -> bool {
        self.jar.read().cookies(url).is_some()
    }
}

impl CookieStore for SessionCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.jar.read().set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.jar.read().cookies(url)
    }
}
