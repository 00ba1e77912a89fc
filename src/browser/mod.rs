pub mod chrome;
pub mod fetcher;
pub mod intercept;
#[cfg(test)]
pub mod scripted;

pub use chrome::{ChromeSession, ChromeSessionProvider};
pub use fetcher::{NetworkEntry, PageElement, PageFetcher, SessionProvider};
pub use intercept::{AjaxInterceptor, InterceptState, ResponseShape};
