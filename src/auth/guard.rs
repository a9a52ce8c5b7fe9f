use tracing::debug;

use super::session::SessionContext;
use crate::api::pages::{DASHBOARD, LOGIN, Page};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect(&'static str),
}

/// Decides a navigation to `path`. Waits for an in-flight session load so a
/// first page load is never mistaken for a signed-out visit.
pub async fn before_each(session: &SessionContext, path: &str) -> Navigation {
    let page = Page::from_path(path);
    if page == Page::Root {
        return Navigation::Redirect(DASHBOARD);
    }

    if session.is_loading() {
        debug!(path, phase = ?session.phase(), "Waiting for session load");
        session.ensure_loaded().await;
    }

    let signed_in = session.user().is_some();
    let decision = if !page.is_public() && !signed_in {
        Navigation::Redirect(LOGIN)
    } else if page.is_guest_only() && signed_in {
        Navigation::Redirect(DASHBOARD)
    } else {
        Navigation::Proceed
    };

    debug!(path, %page, signed_in, ?decision, "Navigation checked");
    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::provider::fake::{FakeIdentity, session};
    use std::sync::Arc;
    use std::time::Duration;

    #[actix_web::test]
    async fn waits_for_first_fetch_before_deciding() {
        let provider = Arc::new(FakeIdentity::gated(Some(session("a@b.c"))));
        let ctx = Arc::new(SessionContext::new(provider.clone(), "http://x"));

        let pending = actix_web::rt::spawn({
            let ctx = ctx.clone();
            async move { before_each(&ctx, "/dashboard").await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        provider.release();
        assert_eq!(pending.await.unwrap(), Navigation::Proceed);
    }

    #[actix_web::test]
    async fn protected_page_without_user_goes_to_login() {
        let ctx = SessionContext::new(Arc::new(FakeIdentity::new(None)), "http://x");

        assert_eq!(
            before_each(&ctx, "/reports/4").await,
            Navigation::Redirect(LOGIN)
        );
        assert!(ctx.snapshot().initialized);
    }

    #[actix_web::test]
    async fn signed_in_user_skips_login_page() {
        let ctx = SessionContext::new(
            Arc::new(FakeIdentity::new(Some(session("a@b.c")))),
            "http://x",
        );

        assert_eq!(
            before_each(&ctx, "/login").await,
            Navigation::Redirect(DASHBOARD)
        );
        assert_eq!(
            before_each(&ctx, "/register-admin").await,
            Navigation::Redirect(DASHBOARD)
        );
        assert_eq!(before_each(&ctx, "/employees").await, Navigation::Proceed);
    }

    #[actix_web::test]
    async fn public_pages_stay_open_when_signed_out() {
        let ctx = SessionContext::new(Arc::new(FakeIdentity::new(None)), "http://x");

        assert_eq!(before_each(&ctx, "/login").await, Navigation::Proceed);
        assert_eq!(before_each(&ctx, "/forgot-password").await, Navigation::Proceed);
    }

    #[actix_web::test]
    async fn root_redirects_to_dashboard() {
        let ctx = SessionContext::new(Arc::new(FakeIdentity::new(None)), "http://x");

        assert_eq!(before_each(&ctx, "/").await, Navigation::Redirect(DASHBOARD));
    }
}
