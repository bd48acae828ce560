//! Customer-facing email text for a quote.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::entities::Quote;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteEmail {
    pub quote_id: i64,
    pub subject: String,
    pub body: String,
}

impl QuoteEmail {
    /// Subject line plus body, ready to paste into a mail client.
    pub fn text(&self) -> String {
        format!("Subject: {}\n\n{}", self.subject, self.body)
    }
}

fn money(d: Decimal) -> String {
    format!(
        "${:.2}",
        d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

fn us_date(d: NaiveDate) -> String {
    d.format("%-m/%-d/%Y").to_string()
}

fn or_na(v: Option<&str>) -> &str {
    v.filter(|s| !s.is_empty()).unwrap_or("N/A")
}

/// Render the email for `quote`, stamped as generated on `generated_on`.
///
/// The greeting uses the joined `customer_name`, or "Valued Customer" when the
/// quote has no customer. Without `valid_until` the quote is described as
/// valid for 30 days from the quote date.
pub fn quote_email(quote: &Quote, generated_on: NaiveDate) -> QuoteEmail {
    let customer = quote
        .customer_name
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or("Valued Customer");
    let pet = quote
        .dog_name
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or("pet");
    let weight = match quote.dog_weight {
        Some(w) if !w.is_zero() => format!("{} lbs", w.normalize()),
        _ => "N/A".to_string(),
    };
    let travel = quote.travel_date.map(us_date).unwrap_or_else(|| "TBD".to_string());
    let valid_until = quote
        .valid_until
        .map(us_date)
        .unwrap_or_else(|| "30 days from quote date".to_string());
    let notes = match quote.notes.as_deref() {
        Some(n) if !n.is_empty() => format!("\nADDITIONAL NOTES:\n{n}\n"),
        _ => String::new(),
    };

    let body = format!(
        "Dear {customer},

Thank you for considering Dogument Pet Travel for your pet's journey. We are pleased to provide you with the following quote for transporting your beloved {pet}.

QUOTE DETAILS
Quote Number: {number}
Pet Name: {dog_name}
Breed: {breed}
Weight: {weight}
Route: {from} → {to}
Travel Date: {travel}

COST BREAKDOWN
Flight Costs: {flight}
Boarding Fees: {boarding}
Medical Expenses (Health Certificates & Documents): {medical}
Additional Fees: {additional}

TOTAL: {total}

{notes}
This quote is valid until: {valid_until}

Our experienced team ensures your pet's safety and comfort throughout the journey. All necessary health certificates, documentation, and compliance with international travel requirements are included in our medical expenses.

To proceed with booking or if you have any questions, please don't hesitate to contact us.

Best regards,
Dogument Pet Travel Team

---
This quote was generated on {generated}",
        number = quote.quote_number,
        dog_name = or_na(quote.dog_name.as_deref()),
        breed = or_na(quote.dog_breed.as_deref()),
        from = or_na(quote.departure_city.as_deref()),
        to = or_na(quote.destination_city.as_deref()),
        flight = money(quote.flight_cost),
        boarding = money(quote.boarding_cost),
        medical = money(quote.medical_cost),
        additional = money(quote.additional_fees),
        total = money(quote.total_amount),
        generated = us_date(generated_on),
    );

    QuoteEmail {
        quote_id: quote.id,
        subject: format!("Pet Travel Quote - {}", quote.quote_number),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::QuoteStatus;
    use chrono::{DateTime, Utc};

    fn quote() -> Quote {
        let at = "2026-03-14T09:00:00Z".parse::<DateTime<Utc>>().unwrap();
        Quote {
            id: 7,
            customer_id: None,
            quote_number: "DPT-123456".into(),
            status: QuoteStatus::Sent,
            dog_name: None,
            dog_breed: None,
            dog_weight: None,
            departure_city: Some("Denver".into()),
            destination_city: None,
            travel_date: None,
            flight_cost: Decimal::new(100, 0),
            boarding_cost: Decimal::new(505, 1),
            medical_cost: Decimal::new(25, 0),
            additional_fees: Decimal::ZERO,
            total_amount: Decimal::new(1755, 1),
            notes: None,
            valid_until: None,
            order_id: None,
            created_at: at,
            updated_at: at,
            customer_name: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[test]
    fn fallbacks_for_missing_details() {
        let mail = quote_email(&quote(), today());
        assert_eq!(mail.quote_id, 7);
        assert_eq!(mail.subject, "Pet Travel Quote - DPT-123456");
        assert!(mail.body.starts_with("Dear Valued Customer,\n"));
        assert!(mail.body.contains("your beloved pet."));
        assert!(mail.body.contains("Pet Name: N/A\nBreed: N/A\nWeight: N/A\n"));
        assert!(mail.body.contains("Route: Denver → N/A\nTravel Date: TBD\n"));
        assert!(mail.body.contains("This quote is valid until: 30 days from quote date\n"));
        assert!(!mail.body.contains("ADDITIONAL NOTES"));
        assert!(mail.body.ends_with("This quote was generated on 3/14/2026"));
    }

    #[test]
    fn amounts_have_two_decimals() {
        let body = quote_email(&quote(), today()).body;
        assert!(body.contains("Flight Costs: $100.00\n"));
        assert!(body.contains("Boarding Fees: $50.50\n"));
        assert!(body.contains("Additional Fees: $0.00\n"));
        assert!(body.contains("\nTOTAL: $175.50\n"));
    }

    #[test]
    fn customer_pet_notes_and_dates_are_rendered() {
        let mut q = quote();
        q.customer_name = Some("Ada".into());
        q.dog_name = Some("Biscuit".into());
        q.dog_weight = Some(Decimal::new(1250, 2));
        q.travel_date = NaiveDate::from_ymd_opt(2026, 6, 1);
        q.valid_until = NaiveDate::from_ymd_opt(2026, 4, 13);
        q.notes = Some("Crate provided".into());

        let mail = quote_email(&q, today());
        assert!(mail.body.starts_with("Dear Ada,\n"));
        assert!(mail.body.contains("your beloved Biscuit."));
        assert!(mail.body.contains("Weight: 12.5 lbs\n"));
        assert!(mail.body.contains("Travel Date: 6/1/2026\n"));
        assert!(mail
            .body
            .contains("TOTAL: $175.50\n\n\nADDITIONAL NOTES:\nCrate provided\n\nThis quote is valid until: 4/13/2026\n"));
        assert!(mail.text().starts_with("Subject: Pet Travel Quote - DPT-123456\n\nDear Ada,"));
    }
}
