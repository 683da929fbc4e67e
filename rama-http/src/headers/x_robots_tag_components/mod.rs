mod robots_tag;
pub use robots_tag::RobotsTag;

mod max_image_preview_setting;
pub use max_image_preview_setting::MaxImagePreviewSetting;

mod custom_rule;
use custom_rule::CustomRule;

mod valid_date;
use valid_date::ValidDate;

pub mod robots_tag_components;
