use serde::{Deserialize, Serialize};

/// A favorite channel pinned by the user, unique by channel ID
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteChannel {
    pub id: String,
    pub name: String,
}

/// The learner profile driving recommendations
///
/// Replaced wholesale on save; the server never patches individual fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub grade: String,
    pub subjects: Vec<String>,
    pub favorite_channels: Vec<FavoriteChannel>,
    pub interests: Vec<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl UserProfile {
    /// Creates an empty profile
    pub fn new() -> Self {
        Self {
            name: String::new(),
            grade: String::new(),
            subjects: Vec::new(),
            favorite_channels: Vec::new(),
            interests: Vec::new(),
        }
    }

    /// A profile unlocks personalized surfaces once name, grade, and at
    /// least one subject are present
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.grade.is_empty() && !self.subjects.is_empty()
    }

    /// Enforces the collection uniqueness rules in place, preserving
    /// insertion order: subjects and interests dedup on exact text,
    /// favorite channels dedup on channel ID
    pub fn normalize(&mut self) {
        dedup_in_order(&mut self.subjects, |s| s.clone());
        dedup_in_order(&mut self.interests, |s| s.clone());
        dedup_in_order(&mut self.favorite_channels, |c| c.id.clone());
    }

    /// Subjects and interests, in that order, for title matching
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.subjects
            .iter()
            .chain(self.interests.iter())
            .map(String::as_str)
    }

    /// The keyword string sent along with favorite-channel searches
    pub fn channel_search_terms(&self) -> String {
        let mut terms: Vec<&str> = self.keywords().collect();
        if !self.grade.is_empty() {
            terms.push(&self.grade);
        }
        terms.join(" ")
    }
}

fn dedup_in_order<T, K: PartialEq>(items: &mut Vec<T>, key: impl Fn(&T) -> K) {
    let mut seen: Vec<K> = Vec::new();
    items.retain(|item| {
        let k = key(item);
        if seen.contains(&k) {
            false
        } else {
            seen.push(k);
            true
        }
    });
}
