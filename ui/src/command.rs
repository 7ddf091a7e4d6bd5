//! Effects returned from `update` and fed back as messages.

use futures::future::{join_all, BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;

/// A batch of pending asynchronous work, each item resolving to a message.
pub struct Command<M> {
    futures: Vec<BoxFuture<'static, M>>,
}

impl<M: Send + 'static> Command<M> {
    pub fn none() -> Self {
        Self { futures: Vec::new() }
    }

    pub fn perform<T, F, G>(future: F, map: G) -> Self
    where
        F: Future<Output = T> + Send + 'static,
        G: FnOnce(T) -> M + Send + 'static,
    {
        Self {
            futures: vec![future.map(map).boxed()],
        }
    }

    pub fn batch(commands: impl IntoIterator<Item = Command<M>>) -> Self {
        Self {
            futures: commands.into_iter().flat_map(|c| c.futures).collect(),
        }
    }

    pub fn map<N, F>(self, f: F) -> Command<N>
    where
        N: Send + 'static,
        F: Fn(M) -> N + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Command {
            futures: self
                .futures
                .into_iter()
                .map(|fut| {
                    let f = f.clone();
                    async move { f(fut.await) }.boxed()
                })
                .collect(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.futures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.futures.len()
    }

    /// Drive every future concurrently and collect their messages.
    pub async fn run(self) -> Vec<M> {
        join_all(self.futures).await
    }
}

impl<M> std::fmt::Debug for Command<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("pending", &self.futures.len())
            .finish()
    }
}

/// A controller in the update loop.
pub trait Program {
    type Message: Send + 'static;

    fn update(&mut self, message: Self::Message) -> Command<Self::Message>;
}

/// Run `command` and every command its messages produce until nothing is left.
pub async fn settle<P: Program>(program: &mut P, command: Command<P::Message>) {
    let mut pending = command;
    while !pending.is_none() {
        let messages = pending.run().await;
        pending = Command::batch(messages.into_iter().map(|m| program.update(m)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        seen: Vec<u32>,
    }

    impl Program for Counter {
        type Message = u32;

        fn update(&mut self, message: u32) -> Command<u32> {
            self.seen.push(message);
            if message < 3 {
                Command::perform(async move { message + 1 }, |n| n)
            } else {
                Command::none()
            }
        }
    }

    #[tokio::test]
    async fn test_settle_follows_chain() {
        let mut counter = Counter { seen: Vec::new() };
        settle(&mut counter, Command::perform(async { 0u32 }, |n| n)).await;
        assert_eq!(counter.seen, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_batch_and_map() {
        let cmd = Command::batch(vec![
            Command::perform(async { 1 }, |n: i32| n),
            Command::none(),
            Command::perform(async { 2 }, |n: i32| n),
        ]);
        assert_eq!(cmd.len(), 2);
        let mapped = cmd.map(|n| format!("#{}", n));
        assert_eq!(mapped.run().await, vec!["#1".to_string(), "#2".to_string()]);
    }
}
