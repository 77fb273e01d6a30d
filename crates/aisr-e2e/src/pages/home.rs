use crate::locator::{AriaRole, Locator};
use crate::page::PageHandle;
use crate::page_object::{BasePage, PageObject};

/// Accessible name of the home page heading
pub const HOME_HEADING: &str = "AISR";

/// Text of the paragraph under the heading
pub const HOME_SUBTITLE: &str = "AI Spaced Repetition";

/// The AISR landing screen at `/`.
///
/// Accessors build fresh locators and never touch the browser; resolution
/// happens when the locator is waited on or asserted.
#[derive(Debug)]
pub struct HomePage {
    base: BasePage,
}

impl HomePage {
    /// The `AISR` heading
    #[must_use]
    pub fn heading(&self) -> Locator {
        self.page().get_by_role(AriaRole::Heading, HOME_HEADING)
    }

    /// The "AI Spaced Repetition" subtitle
    #[must_use]
    pub fn subtitle(&self) -> Locator {
        self.page().get_by_text(HOME_SUBTITLE)
    }
}

impl PageObject for HomePage {
    const ROUTE: &'static str = "/";

    fn from_page(page: PageHandle) -> Self {
        Self {
            base: BasePage::new(page),
        }
    }

    fn base(&self) -> &BasePage {
        &self.base
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::E2eConfig;
    use crate::driver::{MockDriver, MockSite};
    use crate::locator::{ElementState, Selector};
    use crate::page_object::PageState;
    use std::sync::Arc;

    fn home(site: MockSite) -> HomePage {
        let config = E2eConfig::new()
            .with_expect_timeout(50)
            .with_poll_interval(5);
        HomePage::from_page(PageHandle::new(
            Box::new(MockDriver::new(Arc::new(site))),
            &config,
        ))
    }

    #[test]
    fn test_accessors_are_lazy() {
        let home = home(MockSite::aisr().unreachable());
        assert_eq!(
            home.heading().selector(),
            &Selector::role(AriaRole::Heading).with_name("AISR")
        );
        assert_eq!(home.subtitle().selector(), &Selector::text(HOME_SUBTITLE));
        assert_eq!(home.state(), PageState::Unattached);
    }

    #[tokio::test]
    async fn test_goto_twice_stays_attached() {
        let home = home(MockSite::aisr());
        home.goto().await.unwrap();
        home.goto().await.unwrap();
        assert!(home.is_attached());
        assert!(home.is_current().await.unwrap());
    }

    #[tokio::test]
    async fn test_heading_resolves_on_home_route() {
        let home = home(MockSite::aisr());
        home.goto().await.unwrap();
        let heading = home
            .heading()
            .wait_for(ElementState::Visible)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(heading.tag, "h1");
        assert_eq!(home.subtitle().text_content().await.unwrap(), HOME_SUBTITLE);
    }

    #[tokio::test]
    async fn test_heading_missing_elsewhere() {
        let home = home(MockSite::aisr());
        home.base().goto("/does-not-exist").await.unwrap();
        assert!(!home.is_current().await.unwrap());
        let heading = home.heading().wait_for(ElementState::Visible).await;
        assert!(heading.is_err());
    }
}
