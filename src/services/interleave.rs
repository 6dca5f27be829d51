use std::collections::HashSet;
use std::collections::VecDeque;

use rand::seq::SliceRandom;

use crate::models::Video;

/// Removes repeated video IDs, keeping the first occurrence
///
/// Applied to every pooled list before it is shaped for display, so no list
/// surfaced to rendering ever repeats an ID.
pub fn dedup_by_id(videos: Vec<Video>) -> Vec<Video> {
    let mut seen: HashSet<String> = HashSet::new();
    videos
        .into_iter()
        .filter(|v| seen.insert(v.id.clone()))
        .collect()
}

/// Uniform random permutation of the pool
///
/// The only place randomness enters feed shaping; interleaving afterwards is
/// fully deterministic.
pub fn shuffle(videos: &mut [Video]) {
    videos.shuffle(&mut rand::rng());
}

/// Round-robin reordering so no channel dominates the feed
///
/// Groups by channel ID in first-seen channel order, preserving each
/// channel's internal order, then takes one video per channel per round until
/// every group is exhausted. Exhausted channels simply stop contributing
/// without disturbing the cadence of the rest.
pub fn interleave_by_channel(videos: Vec<Video>) -> Vec<Video> {
    let mut groups: Vec<(String, VecDeque<Video>)> = Vec::new();
    for video in videos {
        match groups.iter_mut().find(|(id, _)| *id == video.channel_id) {
            Some((_, group)) => group.push_back(video),
            None => {
                let id = video.channel_id.clone();
                groups.push((id, VecDeque::from([video])));
            }
        }
    }

    let mut interleaved = Vec::new();
    loop {
        let mut took_any = false;
        for (_, group) in groups.iter_mut() {
            if let Some(video) = group.pop_front() {
                interleaved.push(video);
                took_any = true;
            }
        }
        if !took_any {
            break;
        }
    }

    interleaved
}
