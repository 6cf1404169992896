//! Pure decision logic for the transcode resumption algorithm (C7). The
//! worker does the I/O (probing files, invoking the encoder); this module
//! only decides, given what's on disk and what the store says, what to do
//! about each file.

use pipeline_model::TranscodeFileStatus;

/// What the worker should do with one `relative_path` entry during the
/// reconciliation pass, before any encoding starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeAction {
    /// No row exists yet, and an output file is already present and
    /// non-empty: record it as `skipped` without encoding.
    RecordAsSkipped,
    /// No row exists yet, and there's no output: create it `pending`.
    CreatePending,
    /// A row exists and its output is present and non-empty: nothing to do.
    LeaveAsIs,
    /// A row exists but its output is missing or zero-length: reset to
    /// `pending` so it gets encoded again.
    ResetToPending,
}

/// Decide the reconciliation action for one file, given its existing row
/// status (if any) and whether its output is present and non-empty.
pub fn decide_resume_action(
    existing_status: Option<TranscodeFileStatus>,
    output_present_nonempty: bool,
) -> ResumeAction {
    match existing_status {
        None if output_present_nonempty => ResumeAction::RecordAsSkipped,
        None => ResumeAction::CreatePending,
        Some(_) if output_present_nonempty => ResumeAction::LeaveAsIs,
        Some(_) => ResumeAction::ResetToPending,
    }
}

/// The integer mean completion across all non-`skipped` entries. Entries
/// at `completed` contribute 100. Returns 100 when every entry was skipped
/// (there's nothing left to encode).
pub fn mean_progress(entries: &[(TranscodeFileStatus, u8)]) -> u8 {
    let counted: Vec<u32> = entries
        .iter()
        .filter(|(status, _)| *status != TranscodeFileStatus::Skipped)
        .map(|(_, progress)| *progress as u32)
        .collect();
    if counted.is_empty() {
        return 100;
    }
    (counted.iter().sum::<u32>() / counted.len() as u32) as u8
}

/// The job is terminally complete once every file is `completed` or `skipped`.
pub fn all_files_done(statuses: &[TranscodeFileStatus]) -> bool {
    statuses.iter().all(|s| s.is_done())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_file_with_no_output_is_created_pending() {
        assert_eq!(decide_resume_action(None, false), ResumeAction::CreatePending);
    }

    #[test]
    fn fresh_file_with_preexisting_output_is_recorded_skipped() {
        assert_eq!(decide_resume_action(None, true), ResumeAction::RecordAsSkipped);
    }

    #[test]
    fn completed_row_with_intact_output_is_left_alone() {
        assert_eq!(
            decide_resume_action(Some(TranscodeFileStatus::Completed), true),
            ResumeAction::LeaveAsIs
        );
    }

    #[test]
    fn completed_row_missing_its_output_is_reset() {
        assert_eq!(
            decide_resume_action(Some(TranscodeFileStatus::Completed), false),
            ResumeAction::ResetToPending
        );
    }

    #[test]
    fn interrupted_in_progress_row_missing_output_is_reset() {
        assert_eq!(
            decide_resume_action(Some(TranscodeFileStatus::InProgress), false),
            ResumeAction::ResetToPending
        );
    }

    #[test]
    fn mean_progress_excludes_skipped_entries() {
        let entries = vec![
            (TranscodeFileStatus::Skipped, 100),
            (TranscodeFileStatus::Completed, 100),
            (TranscodeFileStatus::InProgress, 40),
        ];
        assert_eq!(mean_progress(&entries), 70);
    }

    #[test]
    fn mean_progress_of_all_skipped_is_full() {
        let entries = vec![(TranscodeFileStatus::Skipped, 100), (TranscodeFileStatus::Skipped, 100)];
        assert_eq!(mean_progress(&entries), 100);
    }

    #[test]
    fn all_done_requires_every_file_completed_or_skipped() {
        assert!(all_files_done(&[TranscodeFileStatus::Completed, TranscodeFileStatus::Skipped]));
        assert!(!all_files_done(&[TranscodeFileStatus::Completed, TranscodeFileStatus::InProgress]));
    }
}
