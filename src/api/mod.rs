pub mod salary;
pub mod staff;

/// Row offset for a 1-based page. Widened to i64 before multiplying so an
/// absurd page number cannot overflow; it simply selects an empty page.
pub(crate) fn page_offset(page: u32, per_page: u32) -> i64 {
    (i64::from(page) - 1) * i64::from(per_page)
}
