//! Collects the first N stories off a [`StoryStream`].

use std::time::Instant;

use qhn_core::TopStories;

use crate::story::StoryStream;

/// Pull up to `n` stories, then stop the upstream fetch.
///
/// Returns early with fewer stories if the stream runs dry. `elapsed` runs
/// from `started` until collection ends.
pub async fn collect(mut stream: StoryStream, n: usize, started: Instant) -> TopStories {
    let mut stories = Vec::with_capacity(n.min(64));

    while stories.len() < n {
        match stream.next().await {
            Some(story) => stories.push(story),
            None => break,
        }
    }
    stream.cancel();

    TopStories { stories, elapsed: started.elapsed() }
}
