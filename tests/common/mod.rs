//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use serde_json::json;
use tokio::sync::{oneshot, Notify};

use waymark::navigation::{TransitionBackend, TransitionError};
use waymark::routing::RouteMatch;
use waymark::{param, path, wildcard, Loader, LoaderContext, Route, Router, Schema};

/// A small app: `/`, `/users`, `/users/:id<integer>`, `/files/*path`.
pub struct App {
    pub root: Route,
    pub users: Route,
    pub user: Route,
    pub files: Route,
}

impl App {
    pub fn new() -> Self {
        let root = Route::root().named("root");
        let users = Route::new([path("users")]).unwrap().named("users");
        let user = users
            .extend([param("id", Schema::integer())])
            .unwrap()
            .named("user");
        let files = Route::new([path("files"), wildcard("path")])
            .unwrap()
            .named("files");
        Self {
            root,
            users,
            user,
            files,
        }
    }

    pub fn routes(&self) -> Vec<Route> {
        vec![
            self.root.clone(),
            self.users.clone(),
            self.user.clone(),
            self.files.clone(),
        ]
    }

    pub fn router(&self) -> Router {
        Router::builder().routes(self.routes()).build()
    }
}

/// Loader that returns `{"route": <pattern>}`.
pub fn echo_loader() -> Loader {
    Loader::new(|ctx: LoaderContext| async move { Ok(json!({ "route": ctx.route.pattern() })) })
}

/// Loader that blocks until the returned gate is opened.
pub fn gated_loader() -> (Loader, Arc<Notify>) {
    let gate = Arc::new(Notify::new());
    let waiter = Arc::clone(&gate);
    let loader = Loader::new(move |_| {
        let waiter = Arc::clone(&waiter);
        async move {
            waiter.notified().await;
            Ok(json!("released"))
        }
    });
    (loader, gate)
}

/// Loader backed by a keyed resource resolved through the returned sender.
pub fn resource_loader(key: &'static str) -> (Loader, oneshot::Sender<serde_json::Value>) {
    let (tx, rx) = oneshot::channel();
    let rx = Arc::new(Mutex::new(Some(rx)));
    let loader = Loader::new(move |ctx: LoaderContext| {
        let rx = Arc::clone(&rx);
        async move {
            let resource = ctx.resources.get_or_create(key, move || async move {
                let rx = rx.lock().unwrap().take();
                match rx {
                    Some(rx) => rx.await.map_err(waymark::resource::ResourceError::new),
                    None => Err(waymark::resource::ResourceError::new("receiver taken")),
                }
            });
            Ok(resource.read()?)
        }
    });
    (loader, tx)
}

/// Transition backend that sleeps for a fixed delay.
pub struct DelayTransition(pub Duration);

impl TransitionBackend for DelayTransition {
    fn run(
        &self,
        _from: Option<Arc<RouteMatch>>,
        _to: Arc<RouteMatch>,
    ) -> BoxFuture<'static, Result<(), TransitionError>> {
        let delay = self.0;
        async move {
            tokio::time::sleep(delay).await;
            Ok(())
        }
        .boxed()
    }
}
