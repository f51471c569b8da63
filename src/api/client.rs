use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use super::endpoint::{Endpoint, Query};
use crate::config::Config;
use crate::errors::{PlannerError, PlannerResult};
use crate::model::{Activity, Bill, Interest, UsedVariables};
use crate::resolve::SimulationContext;

/// Async client for the planning backend.
///
/// Every call is scoped by an explicit [`SimulationContext`]. Non-2xx
/// responses become [`PlannerError::Backend`] and are never retried.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(config: &Config) -> PlannerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Self::with_client(&config.api_base_url, http)
    }

    pub fn with_client(base_url: &str, http: reqwest::Client) -> PlannerResult<Self> {
        let base =
            Url::parse(base_url).map_err(|_| PlannerError::InvalidUrl(base_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(PlannerError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(
        &self,
        endpoint: Endpoint<'_>,
        query: Query,
        ctx: &SimulationContext<'_>,
    ) -> PlannerResult<Url> {
        endpoint.url(&self.base, &query, ctx)
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        request: RequestBuilder,
    ) -> PlannerResult<String> {
        debug!(%method, %url, "sending backend request");
        let response = request.send().await.map_err(|err| {
            error!(%method, %url, error = %err, "backend request failed");
            PlannerError::Http(err)
        })?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!(%method, %url, status = status.as_u16(), "backend rejected request");
            return Err(PlannerError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn send(&self, method: Method, url: Url) -> PlannerResult<String> {
        let request = self.http.request(method.clone(), url.clone());
        self.execute(method, url, request).await
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> PlannerResult<String> {
        let request = self.http.request(method.clone(), url.clone()).json(body);
        self.execute(method, url, request).await
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> PlannerResult<T> {
        let body = self.send(Method::GET, url).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn list_bills(
        &self,
        account: &str,
        window: Option<(NaiveDate, NaiveDate)>,
        ctx: &SimulationContext<'_>,
    ) -> PlannerResult<Vec<Bill>> {
        let query = window.map_or_else(Query::new, |(start, end)| Query::window(start, end));
        self.get(self.url(Endpoint::Bills { account }, query, ctx)?)
            .await
    }

    /// Creates a bill and returns the id the backend assigned, when it reports one.
    pub async fn create_bill(
        &self,
        account: &str,
        bill: &Bill,
        ctx: &SimulationContext<'_>,
    ) -> PlannerResult<Option<String>> {
        let url = self.url(
            Endpoint::Bills { account },
            Query::transfer(bill.is_transfer),
            ctx,
        )?;
        let body = self.send_json(Method::POST, url, bill).await?;
        info!(account, bill = %bill.name, simulation = ctx.name(), "created bill");
        created_id(&body)
    }

    pub async fn update_bill(
        &self,
        account: &str,
        bill: &Bill,
        ctx: &SimulationContext<'_>,
    ) -> PlannerResult<()> {
        let id = bill.id.as_deref().ok_or(PlannerError::MissingId("bill"))?;
        let url = self.url(
            Endpoint::Bill { account, bill: id },
            Query::transfer(bill.is_transfer),
            ctx,
        )?;
        self.send_json(Method::PUT, url, bill).await?;
        info!(account, bill = id, simulation = ctx.name(), "updated bill");
        Ok(())
    }

    pub async fn delete_bill(
        &self,
        account: &str,
        bill: &Bill,
        ctx: &SimulationContext<'_>,
    ) -> PlannerResult<()> {
        let id = bill.id.as_deref().ok_or(PlannerError::MissingId("bill"))?;
        let url = self.url(
            Endpoint::Bill { account, bill: id },
            Query::transfer(bill.is_transfer),
            ctx,
        )?;
        self.send(Method::DELETE, url).await?;
        info!(account, bill = id, simulation = ctx.name(), "deleted bill");
        Ok(())
    }

    /// Enters the bill's next occurrence as a one-off activity. The backend
    /// resolves `{HALF}`/`{FULL}` amounts and advances the bill.
    pub async fn enter_bill(
        &self,
        account: &str,
        bill: &Bill,
        activity: &Activity,
        ctx: &SimulationContext<'_>,
    ) -> PlannerResult<()> {
        let id = bill.id.as_deref().ok_or(PlannerError::MissingId("bill"))?;
        let url = self.url(
            Endpoint::Bill { account, bill: id },
            Query::transfer(bill.is_transfer).as_activity(),
            ctx,
        )?;
        self.send_json(Method::POST, url, activity).await?;
        info!(account, bill = id, date = %activity.date, "entered bill occurrence");
        Ok(())
    }

    /// Skips the bill's next occurrence without recording an activity.
    pub async fn skip_bill(
        &self,
        account: &str,
        bill: &Bill,
        ctx: &SimulationContext<'_>,
    ) -> PlannerResult<()> {
        let id = bill.id.as_deref().ok_or(PlannerError::MissingId("bill"))?;
        let url = self.url(
            Endpoint::Bill { account, bill: id },
            Query::transfer(bill.is_transfer).skip(),
            ctx,
        )?;
        self.send(Method::POST, url).await?;
        info!(account, bill = id, "skipped bill occurrence");
        Ok(())
    }

    pub async fn list_interests(
        &self,
        account: &str,
        ctx: &SimulationContext<'_>,
    ) -> PlannerResult<Vec<Interest>> {
        self.get(self.url(Endpoint::Interests { account }, Query::new(), ctx)?)
            .await
    }

    /// Replaces the account's whole interest list.
    pub async fn save_interests(
        &self,
        account: &str,
        interests: &[Interest],
        ctx: &SimulationContext<'_>,
    ) -> PlannerResult<()> {
        let url = self.url(Endpoint::Interests { account }, Query::new(), ctx)?;
        self.send_json(Method::POST, url, interests).await?;
        info!(account, entries = interests.len(), "saved interest list");
        Ok(())
    }

    /// Skips the next interest accrual of the account.
    pub async fn skip_interest(
        &self,
        account: &str,
        ctx: &SimulationContext<'_>,
    ) -> PlannerResult<()> {
        let url = self.url(Endpoint::Interests { account }, Query::new().skip(), ctx)?;
        self.send(Method::POST, url).await?;
        info!(account, "skipped interest accrual");
        Ok(())
    }

    /// Activities plus projected bill occurrences and accruals for the window.
    pub async fn consolidated_activity(
        &self,
        account: &str,
        start: NaiveDate,
        end: NaiveDate,
        ctx: &SimulationContext<'_>,
    ) -> PlannerResult<Vec<Activity>> {
        let url = self.url(
            Endpoint::ConsolidatedActivity { account },
            Query::window(start, end),
            ctx,
        )?;
        self.get(url).await
    }

    pub async fn create_activity(
        &self,
        account: &str,
        activity: &Activity,
        ctx: &SimulationContext<'_>,
    ) -> PlannerResult<Option<String>> {
        let url = self.url(
            Endpoint::Activities { account },
            Query::transfer(activity.is_transfer),
            ctx,
        )?;
        let body = self.send_json(Method::POST, url, activity).await?;
        info!(account, activity = %activity.name, "created activity");
        created_id(&body)
    }

    pub async fn update_activity(
        &self,
        account: &str,
        activity: &Activity,
        ctx: &SimulationContext<'_>,
    ) -> PlannerResult<()> {
        let id = activity
            .id
            .as_deref()
            .ok_or(PlannerError::MissingId("activity"))?;
        let url = self.url(
            Endpoint::Activity {
                account,
                activity: id,
            },
            Query::transfer(activity.is_transfer),
            ctx,
        )?;
        self.send_json(Method::PUT, url, activity).await?;
        info!(account, activity = id, "updated activity");
        Ok(())
    }

    pub async fn delete_activity(
        &self,
        account: &str,
        activity: &Activity,
        ctx: &SimulationContext<'_>,
    ) -> PlannerResult<()> {
        let id = activity
            .id
            .as_deref()
            .ok_or(PlannerError::MissingId("activity"))?;
        let url = self.url(
            Endpoint::Activity {
                account,
                activity: id,
            },
            Query::transfer(activity.is_transfer),
            ctx,
        )?;
        self.send(Method::DELETE, url).await?;
        info!(account, activity = id, "deleted activity");
        Ok(())
    }

    /// Variable name -> records referencing it, across all accounts.
    pub async fn used_variables(
        &self,
        ctx: &SimulationContext<'_>,
    ) -> PlannerResult<UsedVariables> {
        self.get(self.url(Endpoint::UsedVariables, Query::new(), ctx)?)
            .await
    }
}

/// The backend answers a create with the new id, either bare or as `{"id": ..}`.
fn created_id(body: &str) -> PlannerResult<Option<String>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let id = match serde_json::from_str::<Value>(body)? {
        Value::String(id) => Some(id),
        Value::Object(map) => map.get("id").and_then(Value::as_str).map(str::to_string),
        _ => None,
    };
    Ok(id)
}
