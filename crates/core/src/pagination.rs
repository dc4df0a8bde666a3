//! Visible page window for listing pagination.
//!
//! The listing shows a small window of page buttons around the current page,
//! plus the first and last page with ellipses where the window does not touch
//! them:
//!
//! ```text
//! current=1,  last=10, window=2:  [1] 2 … 10
//! current=5,  last=10, window=2:  1 … 4 [5] 6 … 10
//! current=10, last=10, window=2:  1 … 9 [10]
//! ```
//!
//! Near either boundary the window is widened so the number of pages shown
//! inside it stays at `window`.

/// Default number of pages in the visible window.
pub const DEFAULT_WINDOW: u32 = 2;

/// Inclusive range of page numbers shown around the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// First page inside the window.
    pub start: u32,
    /// Last page inside the window.
    pub end: u32,
}

impl PageWindow {
    /// Compute the window for `current` out of `last` pages.
    ///
    /// `last` is treated as at least 1, `current` is clamped to `1..=last`,
    /// and `size` is treated as at least 1.
    #[must_use]
    pub fn compute(current: u32, last: u32, size: u32) -> Self {
        let last = last.max(1);
        let current = current.clamp(1, last);
        let size = size.max(1);
        let half = size / 2;

        let mut start = current.saturating_sub(half).max(1);
        let mut end = current.saturating_add(half).min(last);

        if end - start < size - 1 {
            if start == 1 {
                end = start.saturating_add(size - 1).min(last);
            } else if end == last {
                start = end.saturating_sub(size - 1).max(1);
            }
        }

        Self { start, end }
    }
}

/// One slot in the rendered page bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    /// A clickable page number.
    Page {
        /// Page number (1-based).
        number: u32,
        /// Whether this is the current page.
        active: bool,
    },
    /// A gap between the window and the first or last page.
    Ellipsis,
}

impl PageItem {
    /// The page number, if this slot is a page.
    #[must_use]
    pub const fn number(&self) -> Option<u32> {
        match self {
            Self::Page { number, .. } => Some(*number),
            Self::Ellipsis => None,
        }
    }
}

/// Lay out the page bar for `current` out of `last` pages.
///
/// Page 1 is prepended when the window starts after it (with an ellipsis when
/// there is a gap), and `last` is appended when the window ends before it
/// (with an ellipsis when there is a gap).
#[must_use]
pub fn page_items(current: u32, last: u32, size: u32) -> Vec<PageItem> {
    let last = last.max(1);
    let current = current.clamp(1, last);
    let window = PageWindow::compute(current, last, size);
    let page = |number: u32| PageItem::Page {
        number,
        active: number == current,
    };

    let mut items = Vec::new();

    if window.start > 1 {
        items.push(page(1));
        if window.start > 2 {
            items.push(PageItem::Ellipsis);
        }
    }

    items.extend((window.start..=window.end).map(page));

    if window.end < last {
        if window.end < last - 1 {
            items.push(PageItem::Ellipsis);
        }
        items.push(page(last));
    }

    items
}

/// Range of result positions shown on a page, for "Showing X–Y of Z results".
///
/// Returns `(0, 0)` when there are no results.
#[must_use]
pub fn result_range(current_page: u32, per_page: u32, total: u64) -> (u64, u64) {
    if total == 0 {
        return (0, 0);
    }

    let current = u64::from(current_page.max(1));
    let per_page = u64::from(per_page);
    let start = (current - 1) * per_page + 1;
    let end = (current * per_page).min(total);
    (start.min(total), end)
}
