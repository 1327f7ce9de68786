//! Closed value sets fixed by the remote API contract.
//!
//! # Design
//! String-valued enums serialize as their wire literal and parse from it with
//! `FromStr`, failing with a `ValidationError` named after the field the enum
//! usually sits in. They also compare equal to `&str` so callers can check a
//! status against the literal the API documents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($field:literal) {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(ValidationError::new(
                        $field,
                        format!("unknown {} value {other:?}", stringify!($name)),
                    )),
                }
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.as_str() == *other
            }
        }
    };
}

wire_enum! {
    /// Payment currency.
    Currency("currency") {
        Kzt => "KZT",
        Usd => "USD",
        Rub => "RUB",
    }
}

wire_enum! {
    /// `Auto` is single-stage; `Manual` authorizes first and waits for a capture.
    CaptureMethod("capture_method") {
        Auto => "AUTO",
        Manual => "MANUAL",
    }
}

wire_enum! {
    OrderStatus("status") {
        Expired => "EXPIRED",
        Unpaid => "UNPAID",
        OnHold => "ON_HOLD",
        Paid => "PAID",
    }
}

wire_enum! {
    PaymentStatus("status") {
        Pending => "PENDING",
        RequiresAction => "REQUIRES_ACTION",
        Approved => "APPROVED",
        Captured => "CAPTURED",
        Cancelled => "CANCELLED",
        Declined => "DECLINED",
    }
}

wire_enum! {
    /// How the payer paid.
    PayerType("type") {
        Card => "CARD",
        CardNoCvc => "CARD_NO_CVC",
        CardWithBinding => "CARD_WITH_BINDING",
        Binding => "BINDING",
        ApplePay => "APPLE_PAY",
        GooglePay => "GOOGLE_PAY",
        Masterpass => "MASTERPASS",
    }
}

wire_enum! {
    RefundStatus("status") {
        Pending => "PENDING",
        Approved => "APPROVED",
        Declined => "DECLINED",
    }
}

wire_enum! {
    /// Name of an order, payment, refund, installment, split, check or OTP event.
    EventName("name") {
        OrderCreated => "ORDER_CREATED",
        PaymentCreated => "PAYMENT_CREATED",
        RefundCreated => "REFUND_CREATED",
        InstallmentCreated => "INSTALLMENT_CREATED",
        SplitCreated => "SPLIT_CREATED",
        OrderOnHold => "ORDER_ON_HOLD",
        OrderPaid => "ORDER_PAID",
        OrderExpired => "ORDER_EXPIRED",
        PaymentDeclined => "PAYMENT_DECLINED",
        PaymentActionRequired => "PAYMENT_ACTION_REQUIRED",
        PaymentApproved => "PAYMENT_APPROVED",
        PaymentCaptured => "PAYMENT_CAPTURED",
        CaptureDeclined => "CAPTURE_DECLINED",
        PaymentCancelled => "PAYMENT_CANCELLED",
        CancelDeclined => "CANCEL_DECLINED",
        RefundApproved => "REFUND_APPROVED",
        RefundDeclined => "REFUND_DECLINED",
        SplitApproved => "SPLIT_APPROVED",
        SplitDeclined => "SPLIT_DECLINED",
        SplitRefundApproved => "SPLIT_REFUND_APPROVED",
        SplitRefundDeclined => "SPLIT_REFUND_DECLINED",
        CheckApproved => "CHECK_APPROVED",
        CheckDeclined => "CHECK_DECLINED",
        OtpSent => "OTP_SENT",
        SendOtpDeclined => "SEND_OTP_DECLINED",
        OtpConfirmed => "OTP_CONFIRMED",
        ConfirmOtpDeclined => "CONFIRM_OTP_DECLINED",
        InstallmentActionRequired => "INSTALLMENT_ACTION_REQUIRED",
        InstallmentIssued => "INSTALLMENT_ISSUED",
        InstallmentRejected => "INSTALLMENT_REJECTED",
        InstallmentDeclined => "INSTALLMENT_DECLINED",
    }
}

impl EventName {
    /// Events that carry 3-D Secure fields (`md`, `pa_req`, `acs_url`, ...).
    pub fn requires_action(&self) -> bool {
        matches!(
            self,
            EventName::PaymentActionRequired | EventName::InstallmentActionRequired
        )
    }
}

/// VAT treatment of a fiscal check position. Serialized as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum OperationType {
    #[default]
    WithoutVat,
    WithVat,
}

impl OperationType {
    pub fn code(&self) -> u16 {
        match self {
            OperationType::WithoutVat => 0,
            OperationType::WithVat => 100,
        }
    }
}

impl TryFrom<u16> for OperationType {
    type Error = ValidationError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(OperationType::WithoutVat),
            100 => Ok(OperationType::WithVat),
            other => Err(ValidationError::new(
                "tax_type",
                format!("unknown OperationType code {other}"),
            )),
        }
    }
}

impl From<OperationType> for u16 {
    fn from(value: OperationType) -> Self {
        value.code()
    }
}
