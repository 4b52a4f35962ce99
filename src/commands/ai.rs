use crate::api::{self, Mode};
use crate::commands::Out;
use crate::flow::{self, Flow, FlowOutput};
use crate::model::{DailyRecord, DateKey};
use crate::pipeline::Session;
use crate::{Config, Result};

/// Runs `flow` against the configured backend and prints its output.
///
/// Empty input is rejected before a backend is created, so a missing API key is not reported
/// for a request that would never be sent.
pub async fn ai(config: &Config, mode: Mode, flow: Flow) -> Result<Out<FlowOutput>> {
    flow.validate()?;
    let backend = api::backend(config, mode).await?;
    let output = flow::invoke(backend.as_ref(), &flow).await?;
    Ok(
        Out::new(format!("Generated the {}", flow.output_field()), output.clone())
            .with_output(output.text),
    )
}

/// The notebook text of `date`, used when summarizing without explicit text.
pub async fn notebook_text<R: DailyRecord>(config: &Config, date: DateKey) -> Result<String> {
    let session: Session<R> = Session::open(config).await;
    Ok(session.record(&date).notebook().to_string())
}
