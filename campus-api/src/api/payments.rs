//! Payment and enrollment handlers
//!
//! Paid courses go through the provider checkout: an order is created here,
//! the browser completes payment, and the provider's signature comes back
//! for verification before enrollment. Free courses enroll directly.

use axum::extract::State;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use campus_common::events::CampusEvent;

use crate::api::auth::CurrentUser;
use crate::api::ApiError;
use crate::clients::payment::PaymentError;
use crate::db;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub course_id: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// POST /api/payment/order
pub async fn create_order(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<Value>, ApiError> {
    let course = db::courses::find(&state.db, &req.course_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Course"))?;
    if !course.is_published {
        return Err(ApiError::BadRequest("Course is not published".to_string()));
    }

    if db::enrollments::is_enrolled(&state.db, &user.id, &course.guid).await? {
        return Err(ApiError::Conflict("Already enrolled".to_string()));
    }

    // Free courses skip the provider entirely
    if course.price_cents == 0 {
        db::enrollments::enroll(&state.db, &user.id, &course.guid, None).await?;
        state.bus.emit(CampusEvent::CourseEnrolled {
            user_id: user.id.clone(),
            course_id: course.guid.clone(),
            timestamp: Utc::now(),
        });
        return Ok(Json(json!({ "enrolled": true, "order": Value::Null })));
    }

    let currency =
        campus_common::db::get_setting_or(&state.db, "payment_currency", "INR").await?;

    let order_id = Uuid::new_v4().to_string();
    let provider_order_id = state
        .payment
        .create_order(course.price_cents, &currency, &order_id)
        .await
        .map_err(|e| match e {
            PaymentError::NotConfigured => {
                ApiError::BadRequest("Payments are not configured on this server".to_string())
            }
            PaymentError::Provider(msg) => ApiError::Upstream(msg),
        })?;

    db::enrollments::create_order(
        &state.db,
        &order_id,
        &user.id,
        &course.guid,
        course.price_cents,
        &currency,
        &provider_order_id,
    )
    .await?;

    Ok(Json(json!({
        "enrolled": false,
        "order": {
            "order_id": order_id,
            "provider_order_id": provider_order_id,
            "amount_cents": course.price_cents,
            "currency": currency,
        }
    })))
}

/// POST /api/payment/verify
pub async fn verify_payment(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<Json<Value>, ApiError> {
    let order = db::enrollments::find_order(&state.db, &req.order_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order"))?;

    if order.user_id != user.id {
        return Err(ApiError::Forbidden("Order belongs to another user".to_string()));
    }
    if order.status == "paid" {
        return Ok(Json(json!({ "enrolled": true, "message": "Already verified" })));
    }

    let provider_order_id = order
        .provider_order_id
        .as_deref()
        .ok_or_else(|| ApiError::Internal("Order missing provider id".to_string()))?;

    let valid = state
        .payment
        .verify_signature(provider_order_id, &req.payment_id, &req.signature)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    if !valid {
        db::enrollments::mark_order(&state.db, &order.order_id, "failed").await?;
        return Err(ApiError::BadRequest("Payment signature mismatch".to_string()));
    }

    db::enrollments::mark_order(&state.db, &order.order_id, "paid").await?;
    db::enrollments::enroll(&state.db, &order.user_id, &order.course_id, Some(&order.order_id))
        .await?;

    info!("Payment verified: order {} course {}", order.order_id, order.course_id);
    state.bus.emit(CampusEvent::CourseEnrolled {
        user_id: order.user_id.clone(),
        course_id: order.course_id.clone(),
        timestamp: Utc::now(),
    });

    Ok(Json(json!({ "enrolled": true })))
}

/// GET /api/enrollments/me
pub async fn my_enrollments(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Value>, ApiError> {
    let courses = db::enrollments::courses_for_user(&state.db, &user.id).await?;
    Ok(Json(json!({ "courses": courses })))
}
