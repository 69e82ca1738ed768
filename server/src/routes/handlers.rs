use std::time::{Duration, Instant};

use log::debug;
use warp::{
    reject,
    reply::{json, with_header, Reply},
};

use crate::card::DailyCard;
use crate::environment::Environment;
use crate::errors::BackendError;
use crate::routes::{
    rejection::{Context, Rejection},
    response::SuccessResponse,
};
use crate::selector::Selection;

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($expression:stmt);+) => {
        let start = Instant::now();

        // `?` in the body returns early, so error replies are untimed
        let result = { $($expression)+ };

        Ok(Box::new(with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    };
}

pub async fn today(environment: Environment) -> RouteResult {
    timed! {
        let selection = environment
            .selector
            .today()
            .await
            .map_err(|e: BackendError| Rejection::new(Context::today(), e))?;

        let card = match &selection {
            Selection::Today(event) => Some(DailyCard::new(event)),
            Selection::Empty => {
                debug!(environment.logger, "Nothing to show today");
                None
            }
        };

        json(&SuccessResponse::Today { event: card })
    }
}

fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}
