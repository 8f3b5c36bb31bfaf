//! In-memory repository doubles
//!
//! Each store keeps its rows in `Arc<Mutex<..>>` maps so a test can hand clones to a
//! service and inspect the resulting state afterwards.

use async_trait::async_trait;
use chrono::Utc;
use coursely_core::models::{
    Certificate, CertificateStatus, CertificateTemplate, CertificateVerification, Course,
    CreatePlanRequest, CreateTemplateRequest, DigitalSignature, Enrollment, EnrollmentStatus,
    Invoice, InvoiceStatus, LiveClass, LiveClassStatus, NewCertificate, NewInvoice,
    NewLiveClass, NewPayment, NewRefund, NewSubscription, NewWebhookRecord, Payment,
    PaymentStatus, Refund, RefundStatus, Subscription, SubscriptionPlan, SubscriptionStatus,
    User, UserRole, WebhookProvider, WebhookRecord, WebhookStatus,
};
use coursely_core::{payment_status_after_refunds, AppError};
use coursely_db::{
    CertificateRepositoryTrait, CourseOwner, CourseRepositoryTrait, EnrollmentRepositoryTrait,
    InvoiceRepositoryTrait, IssuanceContext, LiveClassRepositoryTrait, PaymentRepositoryTrait,
    RefundRepositoryTrait, SubscriptionRepositoryTrait, UserRepositoryTrait,
    WebhookRecordRepositoryTrait,
};
use coursely_storage::{Storage, StorageError, StorageResult};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Default)]
struct BillingState {
    invoices: HashMap<Uuid, Invoice>,
    payments: HashMap<Uuid, Payment>,
    refunds: HashMap<Uuid, Refund>,
    plans: HashMap<Uuid, SubscriptionPlan>,
    subscriptions: HashMap<Uuid, Subscription>,
    webhooks: HashMap<Uuid, WebhookRecord>,
    invoice_seq: u32,
    fail_payment_insert: bool,
}

impl BillingState {
    fn recompute(&mut self, payment_id: Uuid) -> Result<Payment, AppError> {
        let refunded: Decimal = self
            .refunds
            .values()
            .filter(|r| r.payment_id == payment_id && r.status != RefundStatus::Failed)
            .map(|r| r.amount)
            .sum();
        let payment = self
            .payments
            .get_mut(&payment_id)
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;
        if refunded > payment.amount {
            return Err(AppError::Conflict(
                "Refunds exceed the payment amount".to_string(),
            ));
        }
        payment.status = payment_status_after_refunds(payment.status, payment.amount, refunded);
        payment.refunded_amount = refunded;
        Ok(payment.clone())
    }
}

/// Payments, invoices, refunds, subscriptions and webhook records
#[derive(Clone, Default)]
pub struct MockBillingStore {
    state: Arc<Mutex<BillingState>>,
}

impl MockBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_payment_inserts(&self) {
        self.state.lock().unwrap().fail_payment_insert = true;
    }

    pub fn invoices(&self) -> Vec<Invoice> {
        self.state.lock().unwrap().invoices.values().cloned().collect()
    }

    pub fn payments(&self) -> Vec<Payment> {
        self.state.lock().unwrap().payments.values().cloned().collect()
    }

    pub fn payment(&self, id: Uuid) -> Option<Payment> {
        self.state.lock().unwrap().payments.get(&id).cloned()
    }

    pub fn invoice(&self, id: Uuid) -> Option<Invoice> {
        self.state.lock().unwrap().invoices.get(&id).cloned()
    }

    pub fn refunds(&self) -> Vec<Refund> {
        self.state.lock().unwrap().refunds.values().cloned().collect()
    }

    pub fn webhook_records(&self) -> Vec<WebhookRecord> {
        self.state.lock().unwrap().webhooks.values().cloned().collect()
    }

    pub fn add_payment(&self, payment: Payment) {
        self.state.lock().unwrap().payments.insert(payment.id, payment);
    }

    pub fn add_refund(&self, refund: Refund) {
        self.state.lock().unwrap().refunds.insert(refund.id, refund);
    }

    pub fn add_plan(&self, plan: SubscriptionPlan) {
        self.state.lock().unwrap().plans.insert(plan.id, plan);
    }

    pub fn add_subscription(&self, subscription: Subscription) {
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .insert(subscription.id, subscription);
    }
}

/// A completed payment of `amount` with a gateway payment id, ready to refund.
pub fn completed_payment(user_id: Uuid, amount: Decimal) -> Payment {
    let now = Utc::now();
    Payment {
        id: Uuid::new_v4(),
        user_id,
        tenant_id: None,
        course_id: None,
        subscription_id: None,
        amount,
        currency: "INR".to_string(),
        payment_method: coursely_core::models::PaymentMethod::Razorpay,
        payment_id: Some("pay_test".to_string()),
        order_id: format!("order_{}", Uuid::new_v4().simple()),
        status: PaymentStatus::Completed,
        refunded_amount: Decimal::ZERO,
        invoice_id: None,
        failure_reason: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn plan(tenant_id: Option<Uuid>, price: Decimal) -> SubscriptionPlan {
    let now = Utc::now();
    SubscriptionPlan {
        id: Uuid::new_v4(),
        tenant_id,
        name: "Monthly".to_string(),
        description: None,
        price,
        currency: "INR".to_string(),
        interval: coursely_core::models::PlanInterval::Month,
        interval_count: 1,
        trial_days: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl InvoiceRepositoryTrait for MockBillingStore {
    async fn create_draft(&self, invoice: NewInvoice) -> Result<Invoice, AppError> {
        let mut state = self.state.lock().unwrap();
        state.invoice_seq += 1;
        let now = Utc::now();
        let created = Invoice {
            id: Uuid::new_v4(),
            invoice_number: format!("INV-TEST-{:05}", state.invoice_seq),
            user_id: invoice.user_id,
            tenant_id: invoice.tenant_id,
            course_id: invoice.course_id,
            subscription_id: invoice.subscription_id,
            subtotal: invoice.subtotal,
            tax_amount: invoice.tax_amount,
            total_amount: invoice.total_amount,
            currency: invoice.currency,
            status: InvoiceStatus::Draft,
            paid_at: None,
            created_at: now,
            updated_at: now,
        };
        state.invoices.insert(created.id, created.clone());
        Ok(created)
    }

    async fn delete_draft(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.lock().unwrap();
        let is_draft = state
            .invoices
            .get(&id)
            .is_some_and(|i| i.status == InvoiceStatus::Draft);
        if is_draft {
            state.invoices.remove(&id);
        }
        Ok(is_draft)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, AppError> {
        Ok(self.state.lock().unwrap().invoices.get(&id).cloned())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Invoice>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .invoices
            .values()
            .filter(|i| i.user_id == user_id)
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PaymentRepositoryTrait for MockBillingStore {
    async fn insert_pending(&self, payment: NewPayment) -> Result<Payment, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_payment_insert {
            return Err(AppError::Database(sqlx::Error::Protocol("connection reset".to_string())));
        }
        let now = Utc::now();
        let created = Payment {
            id: Uuid::new_v4(),
            user_id: payment.user_id,
            tenant_id: payment.tenant_id,
            course_id: payment.course_id,
            subscription_id: payment.subscription_id,
            amount: payment.amount,
            currency: payment.currency,
            payment_method: payment.payment_method,
            payment_id: None,
            order_id: payment.order_id,
            status: PaymentStatus::Pending,
            refunded_amount: Decimal::ZERO,
            invoice_id: Some(payment.invoice_id),
            failure_reason: None,
            created_at: now,
            updated_at: now,
        };
        state.payments.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>, AppError> {
        Ok(self.state.lock().unwrap().payments.get(&id).cloned())
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Payment>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .payments
            .values()
            .find(|p| p.order_id == order_id)
            .cloned())
    }

    async fn complete(&self, id: Uuid, gateway_payment_id: &str) -> Result<Payment, AppError> {
        let mut state = self.state.lock().unwrap();
        let payment = state
            .payments
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;
        if !matches!(payment.status, PaymentStatus::Pending | PaymentStatus::Failed) {
            return Ok(payment.clone());
        }
        payment.status = PaymentStatus::Completed;
        payment.payment_id = Some(gateway_payment_id.to_string());
        payment.failure_reason = None;
        let payment = payment.clone();
        if let Some(invoice) = payment
            .invoice_id
            .and_then(|invoice_id| state.invoices.get_mut(&invoice_id))
        {
            invoice.status = InvoiceStatus::Paid;
            invoice.paid_at = Some(Utc::now());
        }
        Ok(payment)
    }

    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<Option<Payment>, AppError> {
        let mut state = self.state.lock().unwrap();
        match state.payments.get_mut(&id) {
            Some(payment) if payment.status == PaymentStatus::Pending => {
                payment.status = PaymentStatus::Failed;
                payment.failure_reason = Some(reason.to_string());
                Ok(Some(payment.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Payment>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .payments
            .values()
            .filter(|p| p.user_id == user_id)
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn has_completed_course_payment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<bool, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state.payments.values().any(|p| {
            p.user_id == user_id
                && p.course_id == Some(course_id)
                && matches!(
                    p.status,
                    PaymentStatus::Completed | PaymentStatus::PartiallyRefunded
                )
        }))
    }
}

#[async_trait]
impl RefundRepositoryTrait for MockBillingStore {
    async fn reserve(&self, refund: NewRefund) -> Result<(Refund, Payment), AppError> {
        let mut state = self.state.lock().unwrap();
        let payment = state
            .payments
            .get(&refund.payment_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;
        if !payment.status.is_refundable() {
            return Err(AppError::Conflict(format!(
                "Payment with status {} cannot be refunded",
                payment.status
            )));
        }
        if payment.refunded_amount + refund.amount > payment.amount {
            return Err(AppError::InvalidInput(
                "Refund exceeds the refundable balance".to_string(),
            ));
        }
        let now = Utc::now();
        let created = Refund {
            id: Uuid::new_v4(),
            payment_id: refund.payment_id,
            amount: refund.amount,
            reason: refund.reason,
            notes: refund.notes,
            status: refund.status,
            provider_refund_id: refund.provider_refund_id,
            created_by: refund.created_by,
            created_at: now,
            updated_at: now,
        };
        state.refunds.insert(created.id, created.clone());
        let payment = state.recompute(created.payment_id)?;
        Ok((created, payment))
    }

    async fn finalize(
        &self,
        refund_id: Uuid,
        status: RefundStatus,
        provider_refund_id: Option<&str>,
    ) -> Result<(Refund, Payment), AppError> {
        let mut state = self.state.lock().unwrap();
        let refund = state
            .refunds
            .get_mut(&refund_id)
            .ok_or_else(|| AppError::NotFound("Refund not found".to_string()))?;
        refund.status = status;
        if let Some(provider_refund_id) = provider_refund_id {
            refund.provider_refund_id = Some(provider_refund_id.to_string());
        }
        let refund = refund.clone();
        let payment = state.recompute(refund.payment_id)?;
        Ok((refund, payment))
    }

    async fn set_status_by_provider_id(
        &self,
        provider_refund_id: &str,
        status: RefundStatus,
    ) -> Result<Option<(Refund, Payment)>, AppError> {
        let mut state = self.state.lock().unwrap();
        let Some(refund) = state
            .refunds
            .values_mut()
            .find(|r| r.provider_refund_id.as_deref() == Some(provider_refund_id))
        else {
            return Ok(None);
        };
        refund.status = status;
        let refund = refund.clone();
        let payment = state.recompute(refund.payment_id)?;
        Ok(Some((refund, payment)))
    }

    async fn list_for_payment(&self, payment_id: Uuid) -> Result<Vec<Refund>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .refunds
            .values()
            .filter(|r| r.payment_id == payment_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SubscriptionRepositoryTrait for MockBillingStore {
    async fn create_plan(
        &self,
        tenant_id: Option<Uuid>,
        request: &CreatePlanRequest,
    ) -> Result<SubscriptionPlan, AppError> {
        let now = Utc::now();
        let created = SubscriptionPlan {
            id: Uuid::new_v4(),
            tenant_id,
            name: request.name.clone(),
            description: request.description.clone(),
            price: request.price,
            currency: request.currency.clone(),
            interval: request.interval,
            interval_count: request.interval_count,
            trial_days: request.trial_days,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.add_plan(created.clone());
        Ok(created)
    }

    async fn get_plan(&self, id: Uuid) -> Result<Option<SubscriptionPlan>, AppError> {
        Ok(self.state.lock().unwrap().plans.get(&id).cloned())
    }

    async fn list_active_plans(
        &self,
        tenant_id: Option<Uuid>,
    ) -> Result<Vec<SubscriptionPlan>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .plans
            .values()
            .filter(|p| p.is_active && (p.tenant_id.is_none() || p.tenant_id == tenant_id))
            .cloned()
            .collect())
    }

    async fn create(&self, subscription: NewSubscription) -> Result<Subscription, AppError> {
        let now = Utc::now();
        let created = Subscription {
            id: Uuid::new_v4(),
            user_id: subscription.user_id,
            plan_id: subscription.plan_id,
            tenant_id: subscription.tenant_id,
            status: SubscriptionStatus::Active,
            current_period_start: subscription.current_period_start,
            current_period_end: subscription.current_period_end,
            trial_start: subscription.trial_start,
            trial_end: subscription.trial_end,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
        };
        self.add_subscription(created.clone());
        Ok(created)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Subscription>, AppError> {
        Ok(self.state.lock().unwrap().subscriptions.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Subscription>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .subscriptions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn cancel(&self, id: Uuid) -> Result<Option<Subscription>, AppError> {
        let mut state = self.state.lock().unwrap();
        match state.subscriptions.get_mut(&id) {
            Some(s) if s.status == SubscriptionStatus::Active => {
                s.status = SubscriptionStatus::Cancelled;
                s.cancelled_at = Some(Utc::now());
                Ok(Some(s.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl WebhookRecordRepositoryTrait for MockBillingStore {
    async fn insert(&self, record: NewWebhookRecord) -> Result<WebhookRecord, AppError> {
        let created = WebhookRecord {
            id: Uuid::new_v4(),
            provider: record.provider,
            event_type: record.event_type,
            event_id: record.event_id,
            payload: record.payload,
            signature_verified: record.signature_verified,
            status: WebhookStatus::Pending,
            error_message: None,
            created_at: Utc::now(),
            processed_at: None,
        };
        self.state
            .lock()
            .unwrap()
            .webhooks
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_processed_duplicate(
        &self,
        provider: WebhookProvider,
        event_id: &str,
        exclude_id: Uuid,
    ) -> Result<Option<WebhookRecord>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .webhooks
            .values()
            .find(|r| {
                r.provider == provider
                    && r.event_id.as_deref() == Some(event_id)
                    && r.id != exclude_id
                    && r.status == WebhookStatus::Processed
                    && r.signature_verified
            })
            .cloned())
    }

    async fn mark_processed(&self, id: Uuid) -> Result<(), AppError> {
        if let Some(record) = self.state.lock().unwrap().webhooks.get_mut(&id) {
            record.status = WebhookStatus::Processed;
            record.processed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error_message: &str) -> Result<(), AppError> {
        if let Some(record) = self.state.lock().unwrap().webhooks.get_mut(&id) {
            record.status = WebhookStatus::Failed;
            record.error_message = Some(error_message.to_string());
        }
        Ok(())
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<WebhookRecord>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .webhooks
            .values()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct LearningState {
    courses: HashMap<Uuid, Course>,
    users: HashMap<Uuid, String>,
    enrollments: HashMap<(Uuid, Uuid), Enrollment>,
    live_classes: HashMap<Uuid, LiveClass>,
    certificates: HashMap<Uuid, Certificate>,
    templates: HashMap<Uuid, CertificateTemplate>,
    signatures: HashMap<Uuid, DigitalSignature>,
    verifications: Vec<CertificateVerification>,
    fail_live_class_insert: bool,
    fail_certificate_insert: bool,
}

/// Courses, enrollments, live classes and certificates
#[derive(Clone, Default)]
pub struct MockLearningStore {
    state: Arc<Mutex<LearningState>>,
}

impl MockLearningStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_course(&self, course: Course) {
        self.state.lock().unwrap().courses.insert(course.id, course);
    }

    pub fn add_user(&self, user_id: Uuid, name: &str) {
        self.state
            .lock()
            .unwrap()
            .users
            .insert(user_id, name.to_string());
    }

    pub fn add_enrollment(&self, user_id: Uuid, course_id: Uuid, status: EnrollmentStatus) {
        let now = Utc::now();
        let enrollment = Enrollment {
            id: Uuid::new_v4(),
            user_id,
            course_id,
            tenant_id: None,
            status,
            progress: if status == EnrollmentStatus::Completed { 100 } else { 0 },
            certificate_issued: false,
            enrolled_at: now,
            completed_at: (status == EnrollmentStatus::Completed).then_some(now),
            updated_at: now,
        };
        self.state
            .lock()
            .unwrap()
            .enrollments
            .insert((user_id, course_id), enrollment);
    }

    pub fn enrollment(&self, user_id: Uuid, course_id: Uuid) -> Option<Enrollment> {
        self.state
            .lock()
            .unwrap()
            .enrollments
            .get(&(user_id, course_id))
            .cloned()
    }

    pub fn add_template(&self, template: CertificateTemplate) {
        self.state
            .lock()
            .unwrap()
            .templates
            .insert(template.id, template);
    }

    pub fn add_signature(&self, signature: DigitalSignature) {
        self.state
            .lock()
            .unwrap()
            .signatures
            .insert(signature.id, signature);
    }

    pub fn certificates(&self) -> Vec<Certificate> {
        self.state
            .lock()
            .unwrap()
            .certificates
            .values()
            .cloned()
            .collect()
    }

    pub fn verifications(&self) -> Vec<CertificateVerification> {
        self.state.lock().unwrap().verifications.clone()
    }

    pub fn live_classes(&self) -> Vec<LiveClass> {
        self.state
            .lock()
            .unwrap()
            .live_classes
            .values()
            .cloned()
            .collect()
    }

    pub fn fail_live_class_inserts(&self) {
        self.state.lock().unwrap().fail_live_class_insert = true;
    }

    pub fn fail_certificate_inserts(&self) {
        self.state.lock().unwrap().fail_certificate_insert = true;
    }
}

#[async_trait]
impl CourseRepositoryTrait for MockLearningStore {
    async fn get(&self, id: Uuid) -> Result<Option<Course>, AppError> {
        Ok(self.state.lock().unwrap().courses.get(&id).cloned())
    }
}

#[async_trait]
impl EnrollmentRepositoryTrait for MockLearningStore {
    async fn find(&self, user_id: Uuid, course_id: Uuid) -> Result<Option<Enrollment>, AppError> {
        Ok(self.enrollment(user_id, course_id))
    }

    async fn enroll(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        tenant_id: Option<Uuid>,
    ) -> Result<Enrollment, AppError> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let enrollment = state
            .enrollments
            .entry((user_id, course_id))
            .or_insert_with(|| Enrollment {
                id: Uuid::new_v4(),
                user_id,
                course_id,
                tenant_id,
                status: EnrollmentStatus::Active,
                progress: 0,
                certificate_issued: false,
                enrolled_at: now,
                completed_at: None,
                updated_at: now,
            });
        if enrollment.status == EnrollmentStatus::Cancelled {
            enrollment.status = EnrollmentStatus::Active;
        }
        Ok(enrollment.clone())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Enrollment>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .enrollments
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        progress: i32,
    ) -> Result<Option<Enrollment>, AppError> {
        let mut state = self.state.lock().unwrap();
        let Some(enrollment) = state.enrollments.get_mut(&(user_id, course_id)) else {
            return Ok(None);
        };
        if enrollment.status == EnrollmentStatus::Cancelled {
            return Ok(None);
        }
        enrollment.progress = progress;
        if progress >= 100 && enrollment.status != EnrollmentStatus::Completed {
            enrollment.status = EnrollmentStatus::Completed;
            enrollment.completed_at = Some(Utc::now());
        }
        Ok(Some(enrollment.clone()))
    }
}

#[async_trait]
impl LiveClassRepositoryTrait for MockLearningStore {
    async fn course_owner(&self, course_id: Uuid) -> Result<Option<CourseOwner>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state.courses.get(&course_id).map(|c| CourseOwner {
            instructor_id: c.instructor_id,
            tenant_id: c.tenant_id,
        }))
    }

    async fn insert(&self, live_class: NewLiveClass) -> Result<LiveClass, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_live_class_insert {
            return Err(AppError::Database(sqlx::Error::Protocol("connection reset".to_string())));
        }
        let now = Utc::now();
        let created = LiveClass {
            id: Uuid::new_v4(),
            course_id: live_class.course_id,
            tenant_id: live_class.tenant_id,
            instructor_id: live_class.instructor_id,
            title: live_class.title,
            description: live_class.description,
            platform: live_class.platform,
            meeting_id: live_class.meeting_id,
            join_url: live_class.join_url,
            host_url: live_class.host_url,
            scheduled_at: live_class.scheduled_at,
            duration_minutes: live_class.duration_minutes,
            status: LiveClassStatus::Scheduled,
            created_at: now,
            updated_at: now,
        };
        state.live_classes.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: Uuid) -> Result<Option<LiveClass>, AppError> {
        Ok(self.state.lock().unwrap().live_classes.get(&id).cloned())
    }

    async fn list_by_course(&self, course_id: Uuid) -> Result<Vec<LiveClass>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .live_classes
            .values()
            .filter(|l| l.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn transition(
        &self,
        id: Uuid,
        expected: LiveClassStatus,
        status: LiveClassStatus,
    ) -> Result<Option<LiveClass>, AppError> {
        let mut state = self.state.lock().unwrap();
        match state.live_classes.get_mut(&id) {
            Some(live_class) if live_class.status == expected => {
                live_class.status = status;
                Ok(Some(live_class.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl CertificateRepositoryTrait for MockLearningStore {
    async fn issuance_context(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<IssuanceContext>, AppError> {
        let state = self.state.lock().unwrap();
        let (Some(recipient), Some(course)) =
            (state.users.get(&user_id), state.courses.get(&course_id))
        else {
            return Ok(None);
        };
        Ok(Some(IssuanceContext {
            recipient_name: recipient.clone(),
            course_title: course.title.clone(),
            instructor_name: state
                .users
                .get(&course.instructor_id)
                .cloned()
                .unwrap_or_else(|| "Instructor".to_string()),
            tenant_id: course.tenant_id,
        }))
    }

    async fn find_issued(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Certificate>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .certificates
            .values()
            .find(|c| {
                c.user_id == user_id
                    && c.course_id == course_id
                    && c.status == CertificateStatus::Issued
            })
            .cloned())
    }

    async fn get_template(&self, id: Uuid) -> Result<Option<CertificateTemplate>, AppError> {
        Ok(self.state.lock().unwrap().templates.get(&id).cloned())
    }

    async fn default_template(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<CertificateTemplate>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .templates
            .values()
            .find(|t| t.is_default && t.tenant_id == Some(tenant_id))
            .cloned())
    }

    async fn get_signature(&self, id: Uuid) -> Result<Option<DigitalSignature>, AppError> {
        Ok(self.state.lock().unwrap().signatures.get(&id).cloned())
    }

    async fn create_and_flag_enrollment(
        &self,
        certificate: NewCertificate,
    ) -> Result<Certificate, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_certificate_insert {
            return Err(AppError::Database(sqlx::Error::Protocol("connection reset".to_string())));
        }
        let duplicate = state.certificates.values().any(|c| {
            c.user_id == certificate.user_id
                && c.course_id == certificate.course_id
                && c.status == CertificateStatus::Issued
        });
        if duplicate {
            return Err(AppError::Conflict(
                "A certificate has already been issued for this course".to_string(),
            ));
        }
        let Some(enrollment) = state
            .enrollments
            .get_mut(&(certificate.user_id, certificate.course_id))
            .filter(|e| e.status == EnrollmentStatus::Completed)
        else {
            return Err(AppError::PreconditionFailed(
                "Course enrollment is not completed".to_string(),
            ));
        };
        enrollment.certificate_issued = true;
        let created = Certificate {
            id: Uuid::new_v4(),
            user_id: certificate.user_id,
            course_id: certificate.course_id,
            tenant_id: certificate.tenant_id,
            template_id: certificate.template_id,
            signature_id: certificate.signature_id,
            certificate_number: certificate.certificate_number,
            verification_code: certificate.verification_code,
            recipient_name: certificate.recipient_name,
            course_title: certificate.course_title,
            storage_key: certificate.storage_key,
            file_url: certificate.file_url,
            status: CertificateStatus::Issued,
            revoked_at: None,
            revocation_reason: None,
            issued_at: Utc::now(),
        };
        state.certificates.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Certificate>, AppError> {
        Ok(self.state.lock().unwrap().certificates.get(&id).cloned())
    }

    async fn find_by_verification_code(
        &self,
        code: &str,
    ) -> Result<Option<Certificate>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .certificates
            .values()
            .find(|c| c.verification_code == code)
            .cloned())
    }

    async fn log_verification(
        &self,
        certificate_id: Option<Uuid>,
        code: &str,
        is_valid: bool,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<CertificateVerification, AppError> {
        let entry = CertificateVerification {
            id: Uuid::new_v4(),
            certificate_id,
            verification_code: code.to_string(),
            is_valid,
            ip_address: ip_address.map(str::to_string),
            user_agent: user_agent.map(str::to_string),
            verified_at: Utc::now(),
        };
        self.state.lock().unwrap().verifications.push(entry.clone());
        Ok(entry)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Certificate>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .certificates
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn revoke(&self, id: Uuid, reason: &str) -> Result<Option<Certificate>, AppError> {
        let mut state = self.state.lock().unwrap();
        let Some(certificate) = state
            .certificates
            .get_mut(&id)
            .filter(|c| c.status == CertificateStatus::Issued)
        else {
            return Ok(None);
        };
        certificate.status = CertificateStatus::Revoked;
        certificate.revoked_at = Some(Utc::now());
        certificate.revocation_reason = Some(reason.to_string());
        let certificate = certificate.clone();
        if let Some(enrollment) = state
            .enrollments
            .get_mut(&(certificate.user_id, certificate.course_id))
        {
            enrollment.certificate_issued = false;
        }
        Ok(Some(certificate))
    }

    async fn create_template(
        &self,
        tenant_id: Option<Uuid>,
        request: &CreateTemplateRequest,
    ) -> Result<CertificateTemplate, AppError> {
        let mut state = self.state.lock().unwrap();
        if request.is_default {
            for template in state.templates.values_mut() {
                if template.tenant_id == tenant_id {
                    template.is_default = false;
                }
            }
        }
        let created = CertificateTemplate {
            id: Uuid::new_v4(),
            tenant_id,
            name: request.name.clone(),
            page_width: request.page_width,
            page_height: request.page_height,
            title: request.title.clone(),
            fields: request.fields.clone(),
            signature_placement: request.signature_placement,
            is_default: request.is_default,
            created_at: Utc::now(),
        };
        state.templates.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_templates(
        &self,
        tenant_id: Option<Uuid>,
    ) -> Result<Vec<CertificateTemplate>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .templates
            .values()
            .filter(|t| t.tenant_id.is_none() || t.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn create_signature(
        &self,
        tenant_id: Option<Uuid>,
        signer_name: &str,
        signer_title: Option<&str>,
        storage_key: &str,
        content_type: &str,
    ) -> Result<DigitalSignature, AppError> {
        let created = DigitalSignature {
            id: Uuid::new_v4(),
            tenant_id,
            signer_name: signer_name.to_string(),
            signer_title: signer_title.map(str::to_string),
            storage_key: storage_key.to_string(),
            content_type: content_type.to_string(),
            created_at: Utc::now(),
        };
        self.add_signature(created.clone());
        Ok(created)
    }
}

/// Counts upserts so identity caching can be asserted
#[derive(Clone, Default)]
pub struct MockUserRepository {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
    upserts: Arc<AtomicUsize>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserRepositoryTrait for MockUserRepository {
    async fn upsert_identity(
        &self,
        id: Uuid,
        tenant_id: Uuid,
        email: &str,
        role: UserRole,
    ) -> Result<User, AppError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock().unwrap();
        let now = Utc::now();
        let user = users.entry(id).or_insert_with(|| User {
            id,
            tenant_id,
            email: email.to_string(),
            full_name: None,
            role,
            created_at: now,
            updated_at: now,
        });
        user.email = email.to_string();
        user.role = role;
        Ok(user.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }
}

/// Blob store kept in a map
#[derive(Clone, Default)]
pub struct MockStorage {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn insert(&self, key: &str, data: Vec<u8>) {
        self.objects.lock().unwrap().insert(key.to_string(), data);
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn put(&self, storage_key: &str, _content_type: &str, data: Vec<u8>) -> StorageResult<String> {
        self.insert(storage_key, data);
        Ok(self.public_url(storage_key))
    }

    async fn get(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.object(storage_key)
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.objects.lock().unwrap().remove(storage_key);
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(storage_key))
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!("/files/{}", storage_key)
    }
}
