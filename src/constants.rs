//! Fixed anchors for the source page. The flow values are rendered as
//! generated bitmap text, so the stable label strings are the only durable
//! way to find the right images without depending on CSS class names.

pub const LAST_UPDATE_LABEL: &str = "Last update";
pub const THROUGH_TURBINE_LABEL: &str = "Through turbine";
pub const THROUGH_POND_HATCH_LABEL: &str = "Through pond hatch";

pub const DEFAULT_SOURCE_URL: &str = "https://powerplants.vattenfall.com/en/boden/";
