//! Payment order lifecycle: create order, verify, refund and the read paths.
//!
//! Creating an order spans our database and a remote gateway, so it runs as a saga:
//!
//! 1. insert a `draft` invoice carrying subtotal, 18% tax and total
//! 2. open the remote order for the invoice total
//! 3. insert the `pending` payment referencing the order and the invoice
//!
//! A failure after step 1 deletes the draft invoice. A failure in step 3 additionally
//! leaves a remote order nobody will pay; its id is logged so it can be reconciled.

use coursely_core::models::{
    CreateOrderRequest, CreateOrderResponse, CreateRefundRequest, Invoice, NewInvoice,
    NewPayment, NewRefund, Payment, PaymentStatus, Refund, RefundResponse, RefundStatus,
    UserRole, VerifyPaymentRequest, VerifyPaymentResponse,
};
use coursely_core::{AppError, InvoiceTotals};
use coursely_db::{
    CourseRepositoryTrait, InvoiceRepositoryTrait, PaymentRepositoryTrait,
    RefundRepositoryTrait, SubscriptionRepositoryTrait,
};
use coursely_gateways::{GatewayRegistry, OrderRequest, RefundRequest, VerificationRequest};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::actor::Actor;

#[derive(Clone)]
pub struct PaymentService {
    payments: Arc<dyn PaymentRepositoryTrait>,
    invoices: Arc<dyn InvoiceRepositoryTrait>,
    refunds: Arc<dyn RefundRepositoryTrait>,
    courses: Arc<dyn CourseRepositoryTrait>,
    subscriptions: Arc<dyn SubscriptionRepositoryTrait>,
    gateways: GatewayRegistry,
}

/// What an order pays for, resolved and price-checked before anything is written
struct OrderSubject {
    tenant_id: Option<Uuid>,
    course_id: Option<Uuid>,
    subscription_id: Option<Uuid>,
}

impl PaymentService {
    pub fn new(
        payments: Arc<dyn PaymentRepositoryTrait>,
        invoices: Arc<dyn InvoiceRepositoryTrait>,
        refunds: Arc<dyn RefundRepositoryTrait>,
        courses: Arc<dyn CourseRepositoryTrait>,
        subscriptions: Arc<dyn SubscriptionRepositoryTrait>,
        gateways: GatewayRegistry,
    ) -> Self {
        Self {
            payments,
            invoices,
            refunds,
            courses,
            subscriptions,
            gateways,
        }
    }

    #[tracing::instrument(skip(self, actor, request), fields(user_id = %actor.user_id, method = %request.payment_method))]
    pub async fn create_order(
        &self,
        actor: &Actor,
        request: CreateOrderRequest,
    ) -> Result<CreateOrderResponse, AppError> {
        request.validate()?;
        let currency = request.currency.to_uppercase();
        let subject = self.resolve_subject(actor, &request, &currency).await?;
        let gateway = self.gateways.payment(request.payment_method)?;

        let totals = InvoiceTotals::from_subtotal(request.amount);
        let invoice = self
            .invoices
            .create_draft(NewInvoice {
                user_id: actor.user_id,
                tenant_id: subject.tenant_id,
                course_id: subject.course_id,
                subscription_id: subject.subscription_id,
                subtotal: totals.subtotal,
                tax_amount: totals.tax_amount,
                total_amount: totals.total_amount,
                currency: currency.clone(),
            })
            .await?;

        let order = match gateway
            .create_order(&OrderRequest {
                receipt: invoice.invoice_number.clone(),
                amount: totals.total_amount,
                currency: currency.clone(),
                customer_id: actor.user_id,
                customer_email: Some(actor.email.clone()),
            })
            .await
        {
            Ok(order) => order,
            Err(e) => {
                tracing::error!(error = %e, invoice_id = %invoice.id, "Gateway order creation failed");
                self.discard_draft(invoice.id).await;
                return Err(e.into());
            }
        };

        let payment = match self
            .payments
            .insert_pending(NewPayment {
                user_id: actor.user_id,
                tenant_id: subject.tenant_id,
                course_id: subject.course_id,
                subscription_id: subject.subscription_id,
                amount: totals.total_amount,
                currency,
                payment_method: request.payment_method,
                order_id: order.order_id.clone(),
                invoice_id: invoice.id,
            })
            .await
        {
            Ok(payment) => payment,
            Err(e) => {
                tracing::warn!(
                    order_id = %order.order_id,
                    method = %request.payment_method,
                    error = %e,
                    "Remote order orphaned: payment row could not be stored"
                );
                self.discard_draft(invoice.id).await;
                return Err(e);
            }
        };

        tracing::info!(
            payment_id = %payment.id,
            order_id = %payment.order_id,
            invoice_number = %invoice.invoice_number,
            total = %payment.amount,
            "Payment order created"
        );

        Ok(CreateOrderResponse {
            payment,
            order: order.raw,
            invoice,
        })
    }

    async fn resolve_subject(
        &self,
        actor: &Actor,
        request: &CreateOrderRequest,
        currency: &str,
    ) -> Result<OrderSubject, AppError> {
        match (request.course_id, request.subscription_id) {
            (Some(_), Some(_)) => Err(AppError::InvalidInput(
                "An order pays for either a course or a subscription, not both".to_string(),
            )),
            (Some(course_id), None) => {
                let course = self
                    .courses
                    .get(course_id)
                    .await?
                    .filter(|c| c.is_published)
                    .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;
                if course.is_free() {
                    return Err(AppError::BadRequest(
                        "This course is free; enroll directly".to_string(),
                    ));
                }
                ensure_price(request.amount, course.price, currency, &course.currency)?;
                Ok(OrderSubject {
                    tenant_id: Some(course.tenant_id),
                    course_id: Some(course.id),
                    subscription_id: None,
                })
            }
            (None, Some(subscription_id)) => {
                let subscription = self
                    .subscriptions
                    .get(subscription_id)
                    .await?
                    .filter(|s| s.user_id == actor.user_id)
                    .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?;
                let plan = self
                    .subscriptions
                    .get_plan(subscription.plan_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Subscription plan not found".to_string()))?;
                ensure_price(request.amount, plan.price, currency, &plan.currency)?;
                Ok(OrderSubject {
                    tenant_id: subscription.tenant_id,
                    course_id: None,
                    subscription_id: Some(subscription.id),
                })
            }
            (None, None) => Ok(OrderSubject {
                tenant_id: Some(actor.tenant_id),
                course_id: None,
                subscription_id: None,
            }),
        }
    }

    async fn discard_draft(&self, invoice_id: Uuid) {
        if let Err(e) = self.invoices.delete_draft(invoice_id).await {
            tracing::error!(error = %e, invoice_id = %invoice_id, "Failed to delete draft invoice");
        }
    }

    #[tracing::instrument(skip(self, actor, request), fields(user_id = %actor.user_id, order_id = %request.order_id))]
    pub async fn verify(
        &self,
        actor: &Actor,
        request: VerifyPaymentRequest,
    ) -> Result<VerifyPaymentResponse, AppError> {
        let payment = self
            .payments
            .find_by_order_id(&request.order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;
        actor.ensure_owner(payment.user_id)?;

        if payment.payment_method != request.payment_method {
            return Err(AppError::BadRequest(format!(
                "Order was created with {}",
                payment.payment_method
            )));
        }

        if !matches!(payment.status, PaymentStatus::Pending | PaymentStatus::Failed) {
            return Ok(VerifyPaymentResponse {
                success: true,
                payment,
            });
        }

        let gateway = self.gateways.payment(payment.payment_method)?;
        let gateway_payment_id = match gateway
            .verify_payment(&VerificationRequest {
                order_id: payment.order_id.clone(),
                payment_id: request.payment_id.clone(),
                signature: request.signature.clone(),
            })
            .await
        {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(
                    target: "audit",
                    event = "payment.verification_failed",
                    payment_id = %payment.id,
                    user_id = %actor.user_id,
                    error = %e,
                    "Payment verification failed"
                );
                return Err(e.into());
            }
        };

        let payment = self.payments.complete(payment.id, &gateway_payment_id).await?;
        tracing::info!(
            target: "audit",
            event = "payment.verified",
            payment_id = %payment.id,
            user_id = %actor.user_id,
            "Payment verified"
        );

        Ok(VerifyPaymentResponse {
            success: true,
            payment,
        })
    }

    /// Reserves the refund against the payment balance, asks the gateway to pay it out and
    /// records the outcome. A gateway failure marks the reserved refund `failed`, which
    /// releases the balance again.
    #[tracing::instrument(skip(self, actor, request), fields(admin_id = %actor.user_id, payment_id = %payment_id))]
    pub async fn refund(
        &self,
        actor: &Actor,
        payment_id: Uuid,
        request: CreateRefundRequest,
    ) -> Result<RefundResponse, AppError> {
        actor.require(UserRole::Admin)?;
        request.validate()?;

        let payment = self
            .payments
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;
        if !payment.status.is_refundable() {
            return Err(AppError::Conflict(format!(
                "Payment with status {} cannot be refunded",
                payment.status
            )));
        }
        let gateway_payment_id = payment.payment_id.clone().ok_or_else(|| {
            AppError::Conflict("Payment has no gateway payment id".to_string())
        })?;
        let gateway = self.gateways.payment(payment.payment_method)?;

        let (reserved, _) = self
            .refunds
            .reserve(NewRefund {
                payment_id,
                amount: request.amount,
                reason: request.reason,
                notes: request.notes.clone(),
                status: RefundStatus::Pending,
                provider_refund_id: None,
                created_by: Some(actor.user_id),
            })
            .await?;

        let outcome = gateway
            .refund(&RefundRequest {
                order_id: payment.order_id.clone(),
                gateway_payment_id,
                amount: request.amount,
                refund_id: reserved.id,
                reason: request.reason.to_string(),
            })
            .await;

        let (refund, payment) = match outcome {
            Ok(gateway_refund) => {
                self.refunds
                    .finalize(
                        reserved.id,
                        gateway_refund.status,
                        Some(&gateway_refund.provider_refund_id),
                    )
                    .await?
            }
            Err(e) => {
                tracing::error!(error = %e, refund_id = %reserved.id, "Gateway refund failed");
                if let Err(db_err) = self
                    .refunds
                    .finalize(reserved.id, RefundStatus::Failed, None)
                    .await
                {
                    tracing::error!(error = %db_err, refund_id = %reserved.id, "Failed to release refund reservation");
                }
                return Err(e.into());
            }
        };

        tracing::info!(
            target: "audit",
            event = "payment.refunded",
            payment_id = %payment.id,
            refund_id = %refund.id,
            amount = %refund.amount,
            reason = %refund.reason,
            status = ?refund.status,
            admin_id = %actor.user_id,
            "Refund issued"
        );

        Ok(RefundResponse { refund, payment })
    }

    pub async fn get_payment(&self, actor: &Actor, id: Uuid) -> Result<Payment, AppError> {
        let payment = self
            .payments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;
        actor.ensure_owner(payment.user_id)?;
        Ok(payment)
    }

    pub async fn list_payments(
        &self,
        actor: &Actor,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Payment>, AppError> {
        self.payments.list_for_user(actor.user_id, limit, offset).await
    }

    pub async fn list_refunds(&self, actor: &Actor, payment_id: Uuid) -> Result<Vec<Refund>, AppError> {
        self.get_payment(actor, payment_id).await?;
        self.refunds.list_for_payment(payment_id).await
    }

    pub async fn get_invoice(&self, actor: &Actor, id: Uuid) -> Result<Invoice, AppError> {
        let invoice = self
            .invoices
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Invoice not found".to_string()))?;
        actor.ensure_owner(invoice.user_id)?;
        Ok(invoice)
    }

    pub async fn list_invoices(
        &self,
        actor: &Actor,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Invoice>, AppError> {
        self.invoices.list_for_user(actor.user_id, limit, offset).await
    }
}

fn ensure_price(
    amount: Decimal,
    price: Decimal,
    currency: &str,
    expected_currency: &str,
) -> Result<(), AppError> {
    if !currency.eq_ignore_ascii_case(expected_currency) {
        return Err(AppError::InvalidInput(format!(
            "Currency must be {}",
            expected_currency
        )));
    }
    if amount != price {
        return Err(AppError::InvalidInput(format!(
            "Amount must equal the listed price of {}",
            price
        )));
    }
    Ok(())
}
