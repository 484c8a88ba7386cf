//! Per-client inbound throttling.
//!
//! Fixed-window counters per client address, enforced before any handler
//! runs. A throttled request never touches the session store.

use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpResponse};
use dashmap::DashMap;
use futures_util::future::LocalBoxFuture;
use log::warn;
use serde_json::json;

use crate::error::RATE_LIMIT_NOTICE;

const MINUTE: Duration = Duration::from_secs(60);
const DAY: Duration = Duration::from_secs(60 * 60 * 24);

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub per_minute: u32,
    pub per_day: u32,
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

impl Window {
    fn new(now: Instant) -> Self {
        Self {
            started: now,
            count: 0,
        }
    }

    /// Counts one request against the window, rolling it over when the span
    /// has elapsed. Returns false when the quota is already spent.
    fn admit(&mut self, now: Instant, span: Duration, quota: u32) -> bool {
        if now.duration_since(self.started) >= span {
            self.started = now;
            self.count = 0;
        }
        if self.count >= quota {
            return false;
        }
        self.count += 1;
        true
    }
}

#[derive(Debug)]
struct ClientQuota {
    minute: Window,
    day: Window,
}

/// Shared limiter state. Clone-cheap: one instance is built at startup and
/// handed to every worker's app factory.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    clients: Arc<DashMap<String, ClientQuota>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            clients: Arc::new(DashMap::new()),
        }
    }

    /// Returns the violated quota description when the client is over one of
    /// its windows.
    fn check(&self, client: &str) -> Result<(), &'static str> {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> Result<(), &'static str> {
        let mut quota = self
            .clients
            .entry(client.to_string())
            .or_insert_with(|| ClientQuota {
                minute: Window::new(now),
                day: Window::new(now),
            });

        if !quota.day.admit(now, DAY, self.config.per_day) {
            return Err("per day");
        }
        if !quota.minute.admit(now, MINUTE, self.config.per_minute) {
            return Err("per minute");
        }
        Ok(())
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimiter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimiterService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimiterService {
            service: Rc::new(service),
            limiter: self.clone(),
        }))
    }
}

pub struct RateLimiterService<S> {
    service: Rc<S>,
    limiter: RateLimiter,
}

impl<S, B> Service<ServiceRequest> for RateLimiterService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let client = crate::middleware::client_addr(&req.connection_info());

        if let Err(limit) = self.limiter.check(&client) {
            warn!(
                "RATE LIMIT EXCEEDED (429) | client {client} | limit {} {limit}",
                match limit {
                    "per minute" => self.limiter.config.per_minute,
                    _ => self.limiter.config.per_day,
                }
            );
            let (request, _) = req.into_parts();
            let response = HttpResponse::TooManyRequests()
                .json(json!({ "response": RATE_LIMIT_NOTICE }))
                .map_into_right_body();
            return Box::pin(async move { Ok(ServiceResponse::new(request, response)) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(|res| res.map_into_left_body()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(per_minute: u32, per_day: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            per_minute,
            per_day,
        })
    }

    #[test]
    fn admits_up_to_the_minute_quota() {
        let limiter = limiter(3, 100);
        let now = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check_at("1.2.3.4", now).is_ok());
        }
        assert_eq!(limiter.check_at("1.2.3.4", now), Err("per minute"));
    }

    #[test]
    fn minute_window_rolls_over() {
        let limiter = limiter(1, 100);
        let now = Instant::now();
        assert!(limiter.check_at("1.2.3.4", now).is_ok());
        assert!(limiter.check_at("1.2.3.4", now).is_err());
        assert!(limiter.check_at("1.2.3.4", now + MINUTE).is_ok());
    }

    #[test]
    fn day_quota_survives_minute_rollover() {
        let limiter = limiter(10, 2);
        let now = Instant::now();
        assert!(limiter.check_at("1.2.3.4", now).is_ok());
        assert!(limiter.check_at("1.2.3.4", now + MINUTE).is_ok());
        assert_eq!(
            limiter.check_at("1.2.3.4", now + MINUTE * 2),
            Err("per day")
        );
    }

    #[test]
    fn clients_are_throttled_independently() {
        let limiter = limiter(1, 100);
        let now = Instant::now();
        assert!(limiter.check_at("1.2.3.4", now).is_ok());
        assert!(limiter.check_at("5.6.7.8", now).is_ok());
        assert!(limiter.check_at("1.2.3.4", now).is_err());
    }
}
