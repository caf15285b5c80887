//! Seams over the browser's task queue, timers, and router.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session store and callback handlers never call `spawn_local`,
//! `gloo-timers`, or the router directly. Browser builds use the types here;
//! tests drive the same code with a `futures` `LocalPool` and recorders.

use std::time::Duration;

use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt as _;

/// Runs detached work on the single UI thread.
pub trait TaskSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

/// Spawns onto the Leptos executor.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserSpawner;

impl TaskSpawner for BrowserSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        leptos::task::spawn_local(task);
    }
}

impl TaskSpawner for futures::executor::LocalSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        if let Err(e) = self.spawn_local(task) {
            log::warn!("local executor refused task: {e}");
        }
    }
}

/// Produces futures that resolve after a delay.
pub trait Delay {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserDelay;

impl Delay for BrowserDelay {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        #[cfg(feature = "csr")]
        {
            Box::pin(gloo_timers::future::sleep(duration))
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = duration;
            Box::pin(futures::future::ready(()))
        }
    }
}

/// Imperatively changes the current route.
pub trait Navigator {
    fn navigate(&self, path: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str),
{
    fn navigate(&self, path: &str) {
        self(path);
    }
}
