//! Row relocation: the append-then-delete pattern used to "move" a row
//! between tabs, since the backing store has no native move operation.

use log::info;

use crate::directory::{ensure_tab, find_tab, main_tab};
use crate::error::LeaveError;
use crate::sheets::{SheetsApi, Tab};

/// Column positions fixed by the intake form. These are an implicit contract
/// with the data producer and must not be re-derived elsewhere.
pub const COL_USER_ID: usize = 0;
pub const COL_EMAIL: usize = 1;
pub const COL_NAME: usize = 4;

/// Well-known status tab titles, lazily created on first use.
pub const TAB_APPROVED: &str = "Approved";
pub const TAB_DECLINED: &str = "Declined";
pub const TAB_DELETED: &str = "Deleted";
pub const TAB_COMMENT: &str = "Comment";

/// Move one row from `source` to the tab named `dest_title`.
///
/// The destination is created if absent. When `new_status` is `Some`, the
/// clone's last (status) cell is overwritten before the append; every other
/// cell is preserved exactly. The append happens before the delete so that a
/// mid-operation failure leaves the row duplicated, never lost.
///
/// `row_index` is a zero-based offset into the rows of the source tab,
/// header included, exactly as returned by the most recent read. Indices are
/// not revalidated against concurrent edits: a stale index that is still in
/// range acts on whichever row occupies that position now.
pub fn relocate(
    api: &dyn SheetsApi,
    spreadsheet_id: &str,
    source: &Tab,
    row_index: usize,
    new_status: Option<&str>,
    dest_title: &str,
) -> Result<(), LeaveError> {
    ensure_tab(api, spreadsheet_id, dest_title)?;

    let rows = api.read_range(spreadsheet_id, &source.title)?;
    let row = rows
        .get(row_index)
        .ok_or(LeaveError::RowNotFound(row_index))?;

    let mut moved = row.clone();
    if let Some(status) = new_status {
        match moved.last_mut() {
            Some(cell) => *cell = status.to_string(),
            None => moved.push(status.to_string()),
        }
    }

    api.append_row(spreadsheet_id, dest_title, &moved)?;
    api.delete_row_range(spreadsheet_id, source.sheet_id, row_index, row_index + 1)?;
    info!(
        "moved row {} from '{}' to '{}'",
        row_index, source.title, dest_title
    );
    Ok(())
}

/// Approve the pending request at `row_index` of the main tab.
pub fn approve_row(
    api: &dyn SheetsApi,
    spreadsheet_id: &str,
    row_index: usize,
) -> Result<(), LeaveError> {
    let source = main_tab(api, spreadsheet_id)?;
    relocate(
        api,
        spreadsheet_id,
        &source,
        row_index,
        Some(TAB_APPROVED),
        TAB_APPROVED,
    )
}

/// Decline the pending request at `row_index` of the main tab.
pub fn decline_row(
    api: &dyn SheetsApi,
    spreadsheet_id: &str,
    row_index: usize,
) -> Result<(), LeaveError> {
    let source = main_tab(api, spreadsheet_id)?;
    relocate(
        api,
        spreadsheet_id,
        &source,
        row_index,
        Some(TAB_DECLINED),
        TAB_DECLINED,
    )
}

/// Archive a processed row from the named status tab into "Deleted".
///
/// The source tab must already exist; archiving from a tab that was never
/// created is a [`LeaveError::SheetNotFound`]. `stamp` controls whether the
/// status cell is rewritten on the way out; `None` keeps the prior value
/// ("Approved"/"Declined") as an audit trail.
pub fn delete_row(
    api: &dyn SheetsApi,
    spreadsheet_id: &str,
    source_title: &str,
    row_index: usize,
    stamp: Option<&str>,
) -> Result<(), LeaveError> {
    let source = find_tab(api, spreadsheet_id, source_title)?
        .ok_or_else(|| LeaveError::SheetNotFound(source_title.to_string()))?;
    relocate(api, spreadsheet_id, &source, row_index, stamp, TAB_DELETED)
}

/// Attach a free-text comment to the request at `row_index` of the main tab.
///
/// Appends `[name, email, comment]` to the "Comment" tab (created on first
/// use). The source row is neither moved nor modified.
pub fn save_comment(
    api: &dyn SheetsApi,
    spreadsheet_id: &str,
    row_index: usize,
    comment: &str,
) -> Result<(), LeaveError> {
    let source = main_tab(api, spreadsheet_id)?;
    let rows = api.read_range(spreadsheet_id, &source.title)?;
    let row = rows
        .get(row_index)
        .ok_or(LeaveError::RowNotFound(row_index))?;

    let name = row.get(COL_NAME).cloned().unwrap_or_default();
    let email = row.get(COL_EMAIL).cloned().unwrap_or_default();

    ensure_tab(api, spreadsheet_id, TAB_COMMENT)?;
    api.append_row(
        spreadsheet_id,
        TAB_COMMENT,
        &[name, email, comment.to_string()],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::fake::FakeSheets;
    use std::sync::atomic::Ordering;

    const HEADER: &[&str] = &["ID", "Email", "From", "To", "Name", "Status"];

    fn seeded() -> FakeSheets {
        let fake = FakeSheets::new();
        fake.add_tab(
            "Requests",
            &[
                HEADER,
                &["u1", "ann@example.com", "2024-03-01", "2024-03-05", "Ann", "Pending"],
                &["u2", "bob@example.com", "2024-04-10", "2024-04-12", "Bob", "Pending"],
            ],
        );
        fake
    }

    #[test]
    fn approve_moves_row_and_stamps_status() {
        let fake = seeded();

        approve_row(&fake, "sid", 1).unwrap();

        let approved = fake.rows(TAB_APPROVED);
        assert_eq!(approved.len(), 1);
        assert_eq!(
            approved[0],
            vec!["u1", "ann@example.com", "2024-03-01", "2024-03-05", "Ann", "Approved"]
        );

        // Source lost the row; Bob shifted up into its position.
        let remaining = fake.rows("Requests");
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[1][COL_USER_ID], "u2");
    }

    #[test]
    fn relocation_preserves_all_cells_except_status() {
        let fake = seeded();

        decline_row(&fake, "sid", 2).unwrap();

        let declined = fake.rows(TAB_DECLINED);
        assert_eq!(declined.len(), 1);
        let moved = &declined[0];
        assert_eq!(
            moved[..moved.len() - 1],
            ["u2", "bob@example.com", "2024-04-10", "2024-04-12", "Bob"]
        );
        assert_eq!(moved.last().unwrap(), "Declined");
    }

    #[test]
    fn out_of_range_index_is_row_not_found() {
        let fake = seeded();

        let err = approve_row(&fake, "sid", 9).unwrap_err();
        assert!(matches!(err, LeaveError::RowNotFound(9)));
        // Nothing was appended anywhere.
        assert!(fake.rows(TAB_APPROVED).is_empty());
    }

    #[test]
    fn stale_index_acts_on_current_occupant_or_errors() {
        let fake = seeded();

        approve_row(&fake, "sid", 1).unwrap();
        // Index 2 no longer exists after the shift.
        let err = approve_row(&fake, "sid", 2).unwrap_err();
        assert!(matches!(err, LeaveError::RowNotFound(2)));
        // Index 1 now names Bob's row, and approving it acts on Bob.
        approve_row(&fake, "sid", 1).unwrap();
        let approved = fake.rows(TAB_APPROVED);
        assert_eq!(approved[1][COL_USER_ID], "u2");
    }

    #[test]
    fn delete_from_missing_status_tab_is_sheet_not_found() {
        let fake = seeded();

        let err = delete_row(&fake, "sid", TAB_APPROVED, 0, None).unwrap_err();
        assert!(matches!(err, LeaveError::SheetNotFound(ref t) if t == TAB_APPROVED));
    }

    #[test]
    fn delete_without_stamp_keeps_prior_status() {
        let fake = seeded();
        approve_row(&fake, "sid", 1).unwrap();

        delete_row(&fake, "sid", TAB_APPROVED, 0, None).unwrap();

        let deleted = fake.rows(TAB_DELETED);
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].last().unwrap(), "Approved");
        assert!(fake.rows(TAB_APPROVED).is_empty());
    }

    #[test]
    fn delete_with_stamp_rewrites_status() {
        let fake = seeded();
        decline_row(&fake, "sid", 1).unwrap();

        delete_row(&fake, "sid", TAB_DECLINED, 0, Some(TAB_DELETED)).unwrap();

        let deleted = fake.rows(TAB_DELETED);
        assert_eq!(deleted[0].last().unwrap(), "Deleted");
    }

    #[test]
    fn failed_delete_leaves_row_duplicated_not_lost() {
        let fake = seeded();
        fake.fail_deletes.store(true, Ordering::SeqCst);

        let err = approve_row(&fake, "sid", 1).unwrap_err();
        assert!(matches!(err, LeaveError::RemoteWrite(_)));

        // The append landed before the delete failed: the row exists in both
        // tabs rather than in neither.
        assert_eq!(fake.rows(TAB_APPROVED).len(), 1);
        assert_eq!(fake.rows("Requests").len(), 3);
    }

    #[test]
    fn save_comment_appends_without_touching_source() {
        let fake = seeded();

        save_comment(&fake, "sid", 1, "enjoy the break").unwrap();

        assert_eq!(
            fake.rows(TAB_COMMENT),
            vec![vec![
                "Ann".to_string(),
                "ann@example.com".to_string(),
                "enjoy the break".to_string()
            ]]
        );
        assert_eq!(fake.rows("Requests").len(), 3);
    }

    #[test]
    fn save_comment_on_short_row_uses_empty_fields() {
        let fake = FakeSheets::new();
        fake.add_tab("Requests", &[HEADER, &["u3", "carol@example.com"]]);

        save_comment(&fake, "sid", 1, "half-filled form").unwrap();

        let comments = fake.rows(TAB_COMMENT);
        assert_eq!(comments[0], vec!["", "carol@example.com", "half-filled form"]);
    }

    #[test]
    fn relocating_an_empty_row_still_gets_a_status_cell() {
        let fake = FakeSheets::new();
        fake.add_tab("Requests", &[HEADER, &[]]);

        approve_row(&fake, "sid", 1).unwrap();

        assert_eq!(fake.rows(TAB_APPROVED), vec![vec!["Approved".to_string()]]);
    }
}
