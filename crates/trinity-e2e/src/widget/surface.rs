// Option surfaces
//
// The popup a dropdown renders its options into. The application uses a few
// component families whose overlays differ in markup; each variant lists the
// selectors to try for its family, most specific first.

/// The family of option popup a widget opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSurface {
    /// Single-value dropdown with a filter box in its overlay.
    Filterable,
    /// Single-value dropdown without a filter box.
    PlainList,
    /// Multi-value dropdown with a filter box. Stays open after each pick.
    MultiSelect,
}

const SELECT_ROOTS: &[&str] = &[".p-select-overlay", ".p-select-panel", "ul[role=\"listbox\"]"];
const SELECT_FILTERS: &[&str] = &["input.p-select-filter", "input[role=\"searchbox\"]"];

const MULTISELECT_ROOTS: &[&str] = &[
    ".p-multiselect-overlay",
    ".p-multiselect-panel",
    "ul[role=\"listbox\"]",
];
const MULTISELECT_FILTERS: &[&str] = &["input.p-multiselect-filter", "input[role=\"searchbox\"]"];

const OPTION: &str = "li[role=\"option\"]";

impl OptionSurface {
    /// Candidate root selectors, tried in order.
    pub fn roots(&self) -> &'static [&'static str] {
        match self {
            OptionSurface::Filterable | OptionSurface::PlainList => SELECT_ROOTS,
            OptionSurface::MultiSelect => MULTISELECT_ROOTS,
        }
    }

    /// Candidate filter-input selectors, or empty when the surface has none.
    pub fn filters(&self) -> &'static [&'static str] {
        match self {
            OptionSurface::Filterable => SELECT_FILTERS,
            OptionSurface::PlainList => &[],
            OptionSurface::MultiSelect => MULTISELECT_FILTERS,
        }
    }

    pub fn option(&self) -> &'static str {
        OPTION
    }

    /// Option selector scoped to a resolved root.
    pub fn options_in(&self, root: &str) -> String {
        format!("{} {}", root, OPTION)
    }

    /// Whether picking an option closes the surface on its own.
    pub fn closes_on_select(&self) -> bool {
        !self.is_multi()
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, OptionSurface::MultiSelect)
    }
}
