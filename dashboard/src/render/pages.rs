//! HTML pages: marketing site, login, contact and the dashboard shell

use chrono::{DateTime, Utc};
use maud::{html, Markup, DOCTYPE};
use shared::{
    format_relative_age, ImageQuality, IndexParameter, Notification, NotificationFilter,
    NotificationType,
};

use crate::services::{DashboardSnapshot, LifecyclePhase};

pub const PRODUCT_NAME: &str = "YieldForecast";

/// Inline feedback shown above a form
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Success(String),
    Error(String),
}

fn layout(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " | " (PRODUCT_NAME) }
                link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
            }
            body class="min-h-screen bg-gray-50 text-gray-900" {
                (nav())
                main { (body) }
                (footer())
            }
        }
    }
}

fn nav() -> Markup {
    html! {
        nav class="flex items-center justify-between px-6 py-4 bg-white shadow" {
            a href="/" class="text-xl font-bold text-green-700" { (PRODUCT_NAME) }
            div class="flex gap-4" {
                a href="/#features" { "Features" }
                a href="/#how-it-works" { "How It Works" }
                a href="/contact" { "Contact" }
                a href="/dashboard" { "Dashboard" }
                a href="/login" class="font-semibold" { "Sign In" }
            }
        }
    }
}

fn footer() -> Markup {
    html! {
        footer class="grid grid-cols-3 gap-8 px-6 py-10 bg-gray-900 text-gray-300" {
            div {
                h4 { "Product" }
                a href="/#features" { "Features" }
                a href="/dashboard" { "Dashboard" }
            }
            div {
                h4 { "Company" }
                a href="/contact" { "Contact" }
            }
            div {
                h4 { "Legal" }
                span { "Privacy" }
                span { "Terms" }
            }
        }
    }
}

fn notice(notice: Option<&Notice>) -> Markup {
    html! {
        @match notice {
            Some(Notice::Success(text)) => div class="notice notice-success" role="status" { (text) },
            Some(Notice::Error(text)) => div class="notice notice-error" role="alert" { (text) },
            None => {},
        }
    }
}

// ============================================================================
// Marketing site
// ============================================================================

const FEATURES: [(&str, &str); 6] = [
    (
        "Yield Prediction",
        "Forecasts from NDVI and satellite imagery predict crop yields weeks in advance.",
    ),
    (
        "Interactive Maps",
        "Visualize your fields with detailed satellite imagery and vegetation health indicators.",
    ),
    (
        "Analytics Dashboard",
        "Track trends, compare seasons, and gain insights from comprehensive data analytics.",
    ),
    (
        "Secure & Private",
        "Your farm data is encrypted and protected with enterprise-grade security measures.",
    ),
    (
        "Real-time Alerts",
        "Get instant notifications about critical changes in crop health and weather conditions.",
    ),
    (
        "Multi-Crop Support",
        "Monitor wheat, corn, rice, and other major crops with specialized prediction models.",
    ),
];

const STEPS: [(&str, &str); 3] = [
    (
        "Define Your Fields",
        "Draw your zones on the map or trace existing field boundaries.",
    ),
    (
        "Satellite Analysis",
        "The system analyzes satellite data, NDVI values, and historical patterns automatically.",
    ),
    (
        "Get Predictions",
        "Receive yield forecasts and actionable insights to optimize your harvest.",
    ),
];

pub fn landing() -> Markup {
    let body = html! {
        section id="hero" class="px-6 py-24 text-center" {
            h1 class="text-5xl font-bold" {
                "Predict Your Harvest with "
                span class="text-green-600" { "Satellite Intelligence" }
            }
            p class="mt-6 text-lg" {
                "Leverage Earth observation technology to forecast crop yields, optimize farming decisions, and maximize your agricultural productivity."
            }
            div class="mt-8 flex justify-center gap-4" {
                a href="/login" class="btn btn-primary" { "Start Free Trial" }
                a href="#features" class="btn" { "Learn More" }
            }
            dl class="mt-12 grid grid-cols-3 gap-6" {
                div { dt { "Prediction Accuracy" } dd { "95%" } }
                div { dt { "Hectares Monitored" } dd { "10M+" } }
                div { dt { "Real-time Updates" } dd { "24/7" } }
            }
        }
        section id="features" class="px-6 py-20 bg-white" {
            h2 class="text-3xl font-bold text-center" { "Powerful Features for Modern Agriculture" }
            p class="text-center" { "Everything you need to make data-driven decisions for your farm" }
            div class="mt-10 grid grid-cols-3 gap-8" {
                @for (title, text) in FEATURES {
                    article class="feature" {
                        h3 { (title) }
                        p { (text) }
                    }
                }
            }
        }
        section id="how-it-works" class="px-6 py-20" {
            h2 class="text-3xl font-bold text-center" { "How It Works" }
            p class="text-center" { "Three simple steps to smarter farming" }
            ol class="mt-10 grid grid-cols-3 gap-8" {
                @for (i, (title, text)) in STEPS.iter().enumerate() {
                    li class="step" {
                        span class="step-number" { (i + 1) }
                        h3 { (title) }
                        p { (text) }
                    }
                }
            }
        }
        section id="cta" class="px-6 py-20 bg-green-700 text-white text-center" {
            h2 class="text-3xl font-bold" { "Ready to Transform Your Farm?" }
            p { "Join thousands of farmers using satellite intelligence to boost productivity" }
            div class="mt-8 flex justify-center gap-4" {
                a href="/login" class="btn btn-light" { "Start Free Trial" }
                a href="/contact" class="btn btn-outline" { "Contact Sales" }
            }
        }
    };
    layout("Satellite crop yield forecasting", body)
}

pub fn login(email: &str, feedback: Option<&Notice>) -> Markup {
    let body = html! {
        section class="max-w-md mx-auto py-16" {
            h1 class="text-3xl font-bold" { "Sign in to " (PRODUCT_NAME) }
            (notice(feedback))
            form method="post" action="/login" class="mt-6 space-y-4" {
                label for="email" { "Email" }
                input id="email" name="email" type="email" required value=(email);
                label for="password" { "Password" }
                input id="password" name="password" type="password" required;
                button type="submit" class="btn btn-primary w-full" { "Sign In" }
            }
        }
    };
    layout("Sign in", body)
}

pub fn contact(feedback: Option<&Notice>) -> Markup {
    let body = html! {
        section class="max-w-xl mx-auto py-16" {
            h1 class="text-3xl font-bold" { "Contact Us" }
            p { "Questions about forecasting for your fields? Send us a message." }
            (notice(feedback))
            form method="post" action="/contact" class="mt-6 space-y-4" {
                label for="name" { "Name" }
                input id="name" name="name" required;
                label for="email" { "Email" }
                input id="email" name="email" type="email" required;
                label for="subject" { "Subject" }
                input id="subject" name="subject";
                label for="message" { "Message" }
                textarea id="message" name="message" rows="6" required {}
                button type="submit" class="btn btn-primary" { "Send Message" }
            }
        }
    };
    layout("Contact", body)
}

// ============================================================================
// Dashboard shell
// ============================================================================

/// Dashboard page rendered from a state snapshot
pub fn dashboard(
    snapshot: &DashboardSnapshot,
    notifications: &[&Notification],
    filter: NotificationFilter,
    now: DateTime<Utc>,
) -> Markup {
    let scene = serde_json::to_string(&snapshot.map).unwrap_or_default();
    let busy = matches!(
        snapshot.phase,
        LifecyclePhase::CheckingAvailability | LifecyclePhase::Forecasting
    );

    let body = html! {
        div class="grid grid-cols-12 gap-4 p-4" {
            section class="col-span-8" {
                div id="map" class="h-[480px] rounded" data-scene=(scene) {}
                @if !snapshot.status_message.is_empty() {
                    p id="status" class="mt-2 text-sm" role="status" { (snapshot.status_message) }
                }
                (layer_panel(snapshot))
                img id="chart" src="/api/dashboard/chart.svg?width=800&height=320&dpr=1"
                    alt="Index values over time" width="800" height="320";
                (records_table(snapshot))
            }
            aside class="col-span-4 space-y-4" {
                (forecast_panel(snapshot, busy))
                (availability_panel(snapshot))
                (notification_panel(notifications, filter, now))
            }
        }
    };
    layout("Dashboard", body)
}

fn forecast_panel(snapshot: &DashboardSnapshot, busy: bool) -> Markup {
    let form = &snapshot.form;
    html! {
        form id="forecast-form" data-endpoint="/api/dashboard/forecast" class="panel" {
            h2 {
                @if snapshot.selected_record_id.is_some() { "Update Forecast" } @else { "New Forecast" }
            }
            label for="location" { "Zone Name" }
            input id="location" name="location" value=(form.location);
            label for="startDate" { "Start Date" }
            input id="startDate" name="startDate" type="date" value=(form.start_date.to_string());
            label for="endDate" { "End Date" }
            input id="endDate" name="endDate" type="date" value=(form.end_date.to_string());
            label for="parameter" { "Index" }
            select id="parameter" name="parameter" {
                @for parameter in IndexParameter::KNOWN {
                    option value=(parameter.as_str()) selected[parameter == form.parameter] {
                        (parameter.as_str()) " - " (parameter.description())
                    }
                }
            }
            button type="submit" disabled[busy || snapshot.geometry.is_none()] {
                @if snapshot.phase == LifecyclePhase::Forecasting { "Processing..." } @else { "Run Forecast" }
            }
            @if snapshot.selected_record_id.is_some() {
                button type="button" data-endpoint="/api/dashboard/cancel" { "Cancel" }
            }
        }
    }
}

fn availability_panel(snapshot: &DashboardSnapshot) -> Markup {
    html! {
        div id="availability" class="panel" {
            h2 { "Satellite Data" }
            button type="button" data-endpoint="/api/dashboard/availability"
                disabled[snapshot.geometry.is_none() || snapshot.phase == LifecyclePhase::CheckingAvailability] {
                "Check Availability"
            }
            @if let Some(error) = &snapshot.availability_error {
                p class="text-red-600" role="alert" { (error) }
                @if snapshot.can_retry_availability {
                    button type="button" data-endpoint="/api/dashboard/availability" { "Retry" }
                }
            }
            @if let Some(availability) = &snapshot.availability {
                p { strong { (availability.total_images) } " images available" }
                @if let Some((start, end)) = availability.covered_range() {
                    p class="text-sm" { (start.to_string()) " to " (end.to_string()) }
                }
                ul {
                    @for date in availability.recent_dates() {
                        li class=(quality_class(date.quality)) {
                            (date.date.to_string()) " - " (format!("{:.0}", date.cloud_coverage)) "% cloud"
                        }
                    }
                }
            }
        }
    }
}

fn layer_panel(snapshot: &DashboardSnapshot) -> Markup {
    html! {
        div id="layers" class="flex gap-4 mt-2" {
            @for (parameter, state) in snapshot.layers.iter() {
                @let gradient = parameter.legend_gradient();
                div class="layer" data-parameter=(parameter.as_str()) {
                    label {
                        input type="checkbox" checked[state.visible] disabled[state.url.is_empty()]
                            data-endpoint={ "/api/dashboard/layers/" (parameter.as_str()) "/toggle" };
                        " " (parameter.as_str())
                    }
                    input type="range" min="0" max="1" step="0.1" value=(state.opacity)
                        data-endpoint={ "/api/dashboard/layers/" (parameter.as_str()) "/opacity" };
                    span class="legend" style={
                        "background:linear-gradient(to right," (gradient[0]) "," (gradient[1]) "," (gradient[2]) ")"
                    } {}
                }
            }
        }
    }
}

fn records_table(snapshot: &DashboardSnapshot) -> Markup {
    html! {
        table id="records" class="w-full mt-4" {
            thead {
                tr {
                    th { "Zone" }
                    th { "Period" }
                    th { "Index" }
                    th { "Value" }
                    th {}
                }
            }
            tbody {
                @if snapshot.records.is_empty() {
                    tr { td colspan="5" { "No forecasts yet. Draw a zone to get started." } }
                }
                @for record in &snapshot.records {
                    tr class=[(snapshot.selected_record_id == Some(record.id)).then_some("selected")]
                        data-endpoint={ "/api/dashboard/records/" (record.id) "/select" } {
                        td { (record.location) }
                        td {
                            (record.start_date.map(|d| d.to_string()).unwrap_or_default())
                            " - "
                            (record.end_date.map(|d| d.to_string()).unwrap_or_default())
                        }
                        td { (record.parameter_or_default().as_str()) }
                        td { (format!("{:.3}", record.chart_value())) }
                        td {
                            button type="button" data-confirm="Delete this record?"
                                data-endpoint={ "/api/dashboard/records/" (record.id) "?confirm=true" } {
                                "Delete"
                            }
                        }
                    }
                }
            }
        }
    }
}

fn notification_panel(
    notifications: &[&Notification],
    filter: NotificationFilter,
    now: DateTime<Utc>,
) -> Markup {
    const TABS: [(NotificationFilter, &str); 5] = [
        (NotificationFilter::All, "all"),
        (NotificationFilter::System, "system"),
        (NotificationFilter::Crop, "crop"),
        (NotificationFilter::Weather, "weather"),
        (NotificationFilter::Activity, "activity"),
    ];
    html! {
        div id="notifications" class="panel" {
            h2 { "Notifications" }
            nav class="flex gap-2" {
                @for (tab, name) in TABS {
                    a href={ "/dashboard?category=" (name) } class=[(tab == filter).then_some("active")] { (name) }
                }
            }
            button type="button" data-endpoint="/api/dashboard/notifications/clear" { "Clear All" }
            @if notifications.is_empty() {
                p class="text-sm text-gray-500" { "No notifications" }
            }
            ul {
                @for n in notifications.iter().rev() {
                    li class={ "notification " (type_class(n.kind)) } {
                        strong { (n.title) }
                        p { (n.message) }
                        time datetime=(n.timestamp.to_rfc3339()) { (format_relative_age(n.timestamp, now)) }
                        button type="button" aria-label="Dismiss"
                            data-endpoint={ "/api/dashboard/notifications/" (n.id.to_string()) "/dismiss" } { "×" }
                    }
                }
            }
        }
    }
}

fn quality_class(quality: ImageQuality) -> &'static str {
    match quality {
        ImageQuality::Good => "quality-good",
        ImageQuality::Medium => "quality-medium",
        ImageQuality::Poor => "quality-poor",
    }
}

fn type_class(kind: NotificationType) -> &'static str {
    match kind {
        NotificationType::Success => "notification-success",
        NotificationType::Warning => "notification-warning",
        NotificationType::Error => "notification-error",
        NotificationType::Info => "notification-info",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_has_all_sections() {
        let page = landing().into_string();
        for id in ["hero", "features", "how-it-works", "cta"] {
            assert!(page.contains(&format!(r#"id="{}""#, id)), "missing {}", id);
        }
        assert!(page.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn test_login_keeps_email_and_escapes_error() {
        let page = login(
            "farmer@example.com",
            Some(&Notice::Error("<bad>".to_string())),
        )
        .into_string();
        assert!(page.contains(r#"value="farmer@example.com""#));
        assert!(page.contains("&lt;bad&gt;"));
    }
}
