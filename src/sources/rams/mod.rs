pub mod client;
pub mod parse;

pub use client::RamsClient;
pub use parse::AttendanceRecord;

/// Exact name match against a saved employee.
pub fn find_employee<'a>(
    records: &'a [AttendanceRecord],
    employee: &str,
) -> Option<&'a AttendanceRecord> {
    records.iter().find(|r| r.name == employee)
}
