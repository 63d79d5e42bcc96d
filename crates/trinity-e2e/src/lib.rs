//! trinity-e2e: Resilient seeding of the Trinity back office
//!
//! Flat fixture rows are grouped into actors, then each actor's items are
//! created through the web UI (or the backend API for timecards), one at a
//! time, with bounded waits and a resumable halt point on failure.
//!
//! # Examples
//!
//! ## Seeding timecards through the API
//!
//! ```ignore
//! use trinity_e2e::{
//!     ApiClient, GroupingSpec, ResumePoint, RunConfig, TimecardApiWorkflow, fixtures, transform,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::load(None)?;
//!     let rows = fixtures::load_csv_rows("fixtures/timecards.csv".as_ref())?;
//!     let actors = transform(rows, &GroupingSpec::by_username());
//!
//!     let api = ApiClient::new(&config.api_url, &config.frontend_origin)?;
//!     let mut workflow = TimecardApiWorkflow::new(api);
//!     let summary = config
//!         .orchestrator()
//!         .run(&mut workflow, &actors, &ResumePoint::default())
//!         .await?;
//!     println!("{} timecards created", summary.items_processed);
//!     Ok(())
//! }
//! ```
//!
//! ## Selecting a dropdown value
//!
//! ```ignore
//! use trinity_e2e::{Widget, WidgetDriver};
//!
//! let driver = WidgetDriver::new(&ui, config.widget_timeouts());
//! let supervisor = Widget::dropdown("#supervisor").named("supervisor").exact();
//! driver.select(&supervisor, "Ana Perez", None).await?;
//! ```

pub mod api;
pub mod config;
pub mod dates;
mod error;
pub mod fixtures;
pub mod orchestrator;
pub mod session;
pub mod submit;
pub mod transform;
pub mod ui;
pub mod widget;
pub mod workflows;

pub use error::{Error, Result};

// Data model
pub use transform::{Actor, GroupingSpec, Row, WorkItem, transform};

// Widget driver
pub use widget::{
    CountingSignal, DataLoadSignal, MatchMode, OptionSurface, SelectOutcome, Widget, WidgetDriver,
    WidgetTimeouts,
};

// Submission loop
pub use submit::{PostCondition, SubmitLoop, SubmitOutcome};

// Sessions and the backend API
pub use api::{ApiClient, InsertRequest, TimecardRecord};
pub use session::{Authenticator, Session, SessionCache};

// Orchestration
pub use orchestrator::{Orchestrator, ResumePoint, RunSummary, Workflow};

pub use config::RunConfig;
pub use ui::{Point, Ui};

#[cfg(feature = "browser")]
pub use ui::playwright::PlaywrightUi;

pub use workflows::{
    ClientContactWorkflow, ClientWorkflow, ContractWorkflow, ContractorWorkflow, CurrencyWorkflow,
    ExpenseWorkflow, ProjectWorkflow, TimecardApiWorkflow, TimecardUiWorkflow, UiContext, UiLogin,
};
