pub mod renderer;
pub mod session;

pub use renderer::{
    render_hit, render_hits, render_job, render_job_list, render_options, Notice, RenderStyle,
    SearchReport,
};
pub use session::{validate_choice, Command, Reaction, SearchMode, Session, SessionError};
