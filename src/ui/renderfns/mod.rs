pub mod footer;
pub mod header;
pub mod utils;

pub use footer::draw_footer;
pub use header::draw_header;
pub use utils::{
  application_status_color, format_date, format_datetime, format_salary, interview_status_color,
  match_score_color, truncate,
};
