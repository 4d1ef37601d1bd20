use services::SaveStatus;

/// Header pill for the save status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusPillVm {
    pub label: &'static str,
    pub class: &'static str,
    pub visible: bool,
}

#[must_use]
pub fn map_save_status(status: &SaveStatus) -> StatusPillVm {
    let class = match status {
        SaveStatus::Idle => "status-pill",
        SaveStatus::Saving => "status-pill saving",
        SaveStatus::Saved { .. } => "status-pill saved",
        SaveStatus::Failed => "status-pill failed",
    };
    StatusPillVm {
        label: status.label(),
        class,
        visible: !matches!(status, SaveStatus::Idle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::time::fixed_now;

    #[test]
    fn maps_each_status() {
        assert!(!map_save_status(&SaveStatus::Idle).visible);
        assert_eq!(map_save_status(&SaveStatus::Saving).label, "Saving…");
        let saved = map_save_status(&SaveStatus::Saved { at: fixed_now() });
        assert_eq!((saved.label, saved.class), ("Saved", "status-pill saved"));
        assert_eq!(map_save_status(&SaveStatus::Failed).label, "Not saved");
    }
}
