//! Session context for a run of downloads
//!
//! A [`Session`] owns everything a download run needs to remember: the
//! profiles seen so far and the bounded list of download tasks. It is passed
//! explicitly to pipeline calls.

use std::collections::VecDeque;

use serde::Serialize;

use crate::app::models::{spec_format, DownloadTask, MediaSpec, Profile, TaskId, TaskStatus};
use crate::constants::session::MAX_DOWNLOAD_ITEMS;
use crate::errors::ProfileResult;

/// Profiles captured during a session, deduplicated by id
#[derive(Debug, Default, Clone)]
pub struct ProfileStore {
    profiles: Vec<Profile>,
    current: Option<usize>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `profile` and make it current
    ///
    /// Returns `false` and leaves the store untouched if a profile with the
    /// same id was already recorded.
    pub fn set_feed(&mut self, profile: Profile) -> bool {
        if self.profiles.iter().any(|p| p.id == profile.id) {
            tracing::debug!("Profile {} already known, ignoring", profile.id);
            return false;
        }
        self.profiles.push(profile);
        self.current = Some(self.profiles.len() - 1);
        true
    }

    /// Most recently recorded profile
    pub fn current(&self) -> Option<&Profile> {
        self.current.and_then(|i| self.profiles.get(i))
    }

    pub fn get(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Bounded list of download tasks, newest first
#[derive(Debug, Clone)]
pub struct DownloadList {
    items: VecDeque<DownloadTask>,
    max_items: usize,
}

impl Default for DownloadList {
    fn default() -> Self {
        Self::with_capacity(MAX_DOWNLOAD_ITEMS)
    }
}

impl DownloadList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_items: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(max_items),
            max_items: max_items.max(1),
        }
    }

    /// Add a download for `profile` with `spec`, deduplicating by profile and spec
    ///
    /// An unfinished task for the same profile and spec is returned as is. A
    /// finished one is restarted under the new filename and moved to the front.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::MissingUrl` if the profile has no URL
    pub fn add(
        &mut self,
        profile: &Profile,
        spec: Option<&MediaSpec>,
        filename: impl Into<String>,
    ) -> ProfileResult<TaskId> {
        let format = spec_format(spec);
        let filename = filename.into();

        if let Some(index) = self
            .items
            .iter()
            .position(|t| t.profile_id == profile.id && t.spec_format == format)
        {
            if !self.items[index].status.is_finished() {
                tracing::info!("{} ({}) is already downloading", profile.id, format);
                return Ok(self.items[index].id.clone());
            }

            if let Some(mut task) = self.items.remove(index) {
                task.restart(filename);
                let id = task.id.clone();
                self.items.push_front(task);
                return Ok(id);
            }
        }

        let task = DownloadTask::new(
            profile.id.clone(),
            format,
            profile.spec_url(spec)?,
            profile.key.clone(),
            filename,
        );
        let id = task.id.clone();
        self.items.push_front(task);
        self.items.truncate(self.max_items);
        Ok(id)
    }

    /// Change the status of a task
    ///
    /// `Done` forces progress to 100 and `Failed` resets it to 0. Returns
    /// `false` if no task has this id.
    pub fn update_status(&mut self, id: &str, status: TaskStatus, error: Option<String>) -> bool {
        let Some(task) = self.get_mut(id) else {
            return false;
        };
        task.status = status;
        match status {
            TaskStatus::Done => {
                task.progress = 100.0;
                task.error = None;
            }
            TaskStatus::Failed => {
                task.progress = 0.0;
                task.error = error;
            }
            TaskStatus::Pending | TaskStatus::Active => {}
        }
        true
    }

    /// Record progress for an active task, clamped to `[0, 100]`
    pub fn update_progress(&mut self, id: &str, percent: f64) -> bool {
        match self.get_mut(id) {
            Some(task) => task.set_progress(percent),
            None => false,
        }
    }

    /// Remove a task, returning it
    pub fn remove(&mut self, id: &str) -> Option<DownloadTask> {
        let index = self.items.iter().position(|t| t.id == id)?;
        self.items.remove(index)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn get(&self, id: &str) -> Option<&DownloadTask> {
        self.items.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut DownloadTask> {
        self.items.iter_mut().find(|t| t.id == id)
    }

    /// Tasks, newest first
    pub fn iter(&self) -> impl Iterator<Item = &DownloadTask> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|t| t.status == TaskStatus::Done)
            .count()
    }

    pub fn summary(&self) -> ListSummary {
        let mut summary = ListSummary {
            total: self.items.len(),
            ..Default::default()
        };
        for task in &self.items {
            match task.status {
                TaskStatus::Pending => summary.pending += 1,
                TaskStatus::Active => summary.active += 1,
                TaskStatus::Done => summary.done += 1,
                TaskStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }
}

/// Task counts per status
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListSummary {
    pub total: usize,
    pub pending: usize,
    pub active: usize,
    pub done: usize,
    pub failed: usize,
}

/// Explicit state of a download run
#[derive(Debug, Default, Clone)]
pub struct Session {
    pub profiles: ProfileStore,
    pub downloads: DownloadList,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a download for `profile` and return the task id
    pub fn enqueue(
        &mut self,
        profile: &Profile,
        spec: Option<&MediaSpec>,
        filename: impl Into<String>,
    ) -> ProfileResult<TaskId> {
        self.downloads.add(profile, spec, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str) -> Profile {
        let mut profile = Profile::from_url(id, format!("https://example.com/{}?token=t", id));
        profile.spec = vec![MediaSpec {
            file_format: "xWT111".to_string(),
            width: None,
            height: None,
            bitrate: None,
        }];
        profile
    }

    #[test]
    fn test_set_feed_dedupes_by_id() {
        let mut store = ProfileStore::new();
        assert!(store.set_feed(profile("a")));
        assert!(store.set_feed(profile("b")));

        let mut dup = profile("a");
        dup.title = "changed".to_string();
        assert!(!store.set_feed(dup));

        assert_eq!(store.len(), 2);
        assert_eq!(store.current().map(|p| p.id.as_str()), Some("b"));
        assert_eq!(store.get("a").map(|p| p.title.as_str()), Some(""));
    }

    #[test]
    fn test_add_new_items_go_first() {
        let mut list = DownloadList::new();
        let a = list.add(&profile("a"), None, "a").unwrap();
        let b = list.add(&profile("b"), None, "b").unwrap();

        let ids: Vec<_> = list.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec![b, a]);
        assert_eq!(list.get(&ids[1]).unwrap().status, TaskStatus::Pending);
    }

    #[test]
    fn test_add_builds_spec_url() {
        let mut list = DownloadList::new();
        let p = profile("a");
        let id = list.add(&p, p.spec.first(), "a").unwrap();
        let task = list.get(&id).unwrap();
        assert_eq!(task.spec_format, "xWT111");
        assert!(task.url.ends_with("X-snsvideoflag=xWT111"));
    }

    #[test]
    fn test_add_returns_unfinished_duplicate() {
        let mut list = DownloadList::new();
        let p = profile("a");
        let first = list.add(&p, None, "first").unwrap();
        list.update_status(&first, TaskStatus::Active, None);

        let second = list.add(&p, None, "second").unwrap();
        assert_eq!(first, second);
        assert_eq!(list.len(), 1);
        assert_eq!(list.get(&first).unwrap().filename, "first");
    }

    #[test]
    fn test_add_restarts_finished_duplicate() {
        let mut list = DownloadList::new();
        let p = profile("a");
        let first = list.add(&p, None, "first").unwrap();
        list.add(&profile("b"), None, "b").unwrap();
        list.update_status(&first, TaskStatus::Failed, Some("boom".to_string()));

        let again = list.add(&p, None, "again").unwrap();
        assert_eq!(again, first);
        assert_eq!(list.len(), 2);

        let front = list.iter().next().unwrap();
        assert_eq!(front.id, first);
        assert_eq!(front.status, TaskStatus::Active);
        assert_eq!(front.filename, "again");
        assert!(front.error.is_none());
    }

    #[test]
    fn test_same_profile_different_spec_is_distinct() {
        let mut list = DownloadList::new();
        let p = profile("a");
        let original = list.add(&p, None, "a").unwrap();
        let spec = list.add(&p, p.spec.first(), "a").unwrap();
        assert_ne!(original, spec);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_list_is_bounded() {
        let mut list = DownloadList::new();
        for i in 0..15 {
            list.add(&profile(&format!("p{}", i)), None, "x").unwrap();
        }
        assert_eq!(list.len(), MAX_DOWNLOAD_ITEMS);
        assert_eq!(list.iter().next().unwrap().profile_id, "p14");
        assert!(list.iter().all(|t| t.profile_id != "p0"));
    }

    #[test]
    fn test_status_forces_progress() {
        let mut list = DownloadList::new();
        let id = list.add(&profile("a"), None, "a").unwrap();

        list.update_status(&id, TaskStatus::Active, None);
        assert!(list.update_progress(&id, 42.0));
        assert_eq!(list.get(&id).unwrap().progress, 42.0);

        list.update_status(&id, TaskStatus::Done, None);
        assert_eq!(list.get(&id).unwrap().progress, 100.0);
        assert_eq!(list.completed_count(), 1);

        list.update_status(&id, TaskStatus::Failed, Some("x".to_string()));
        let task = list.get(&id).unwrap();
        assert_eq!(task.progress, 0.0);
        assert_eq!(task.error.as_deref(), Some("x"));

        assert!(!list.update_status("missing", TaskStatus::Done, None));
    }

    #[test]
    fn test_progress_only_while_active_and_clamped() {
        let mut list = DownloadList::new();
        let id = list.add(&profile("a"), None, "a").unwrap();

        assert!(!list.update_progress(&id, 10.0));
        assert_eq!(list.get(&id).unwrap().progress, 0.0);

        list.update_status(&id, TaskStatus::Active, None);
        list.update_progress(&id, 140.0);
        assert_eq!(list.get(&id).unwrap().progress, 100.0);
        list.update_progress(&id, -3.0);
        assert_eq!(list.get(&id).unwrap().progress, 0.0);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut session = Session::new();
        let a = session.enqueue(&profile("a"), None, "a").unwrap();
        session.enqueue(&profile("b"), None, "b").unwrap();

        assert_eq!(session.downloads.remove(&a).map(|t| t.profile_id), Some("a".to_string()));
        assert!(session.downloads.remove(&a).is_none());
        assert_eq!(session.downloads.len(), 1);

        session.downloads.clear();
        assert!(session.downloads.is_empty());
    }

    #[test]
    fn test_summary_counts() {
        let mut list = DownloadList::new();
        let a = list.add(&profile("a"), None, "a").unwrap();
        let b = list.add(&profile("b"), None, "b").unwrap();
        list.add(&profile("c"), None, "c").unwrap();
        list.update_status(&a, TaskStatus::Done, None);
        list.update_status(&b, TaskStatus::Failed, None);

        let summary = list.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.done, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.pending, 1);
    }
}
