use consultation::{
    CONFIRMATION_BODY, CONFIRMATION_TITLE, ConsultationDraft, ConsultationForm,
    ConsultationIntake, ConsultationType, InMemoryAuthProvider, SignInError, SignInFlow,
    SubmitError,
};
use std::sync::Arc;
use tracing::info;

use crate::console::{Console, parse_consultation_type, parse_urgency};

/// Walks the user from the consultation offer through sign-in to a
/// submitted request.
pub struct ConsultationWizard {
    console: Console,
    flow: SignInFlow,
    intake: ConsultationIntake,
    /// Set when links are issued locally instead of being emailed
    mailbox: Option<Arc<InMemoryAuthProvider>>,
}

impl ConsultationWizard {
    pub fn new(
        console: Console,
        flow: SignInFlow,
        intake: ConsultationIntake,
        mailbox: Option<Arc<InMemoryAuthProvider>>,
    ) -> Self {
        Self {
            console,
            flow,
            intake,
            mailbox,
        }
    }

    pub async fn run(&mut self, draft: &ConsultationDraft) {
        let form = if self.flow.session().is_some() {
            ConsultationForm::from_draft(Some(draft))
        } else {
            match self.sign_in(draft).await {
                Some(form) => form,
                None => return,
            }
        };

        self.fill_and_submit(form).await;
    }

    async fn sign_in(&mut self, draft: &ConsultationDraft) -> Option<ConsultationForm> {
        println!();
        println!("Connect with an Expert");
        println!(
            "We'll connect you with a {} expert who can help with your request.",
            draft.category.as_str()
        );
        println!("Enter your email to receive a secure link.");

        let email = loop {
            let email = self.console.ask("Your email address: ").await?;
            match self.flow.request_link(&email, draft).await {
                Ok(()) => break email,
                Err(SignInError::InvalidEmail) => println!("{}", SignInError::InvalidEmail),
                Err(e) => {
                    println!("{e}");
                    return None;
                }
            }
        };

        println!("Check your email! We've sent a secure link to {email}.");
        if let Some(link) = self.mailbox.as_ref().and_then(|m| m.last_link(&email)) {
            println!("Sign-in link: {link}");
        }

        let url = self.console.ask("Paste the link from your email: ").await?;
        let console = self.console.clone();
        let confirm_email = move || async move {
            console
                .ask("Please provide your email for confirmation: ")
                .await
        };
        let verification = match self.flow.verify(&url, confirm_email).await {
            Ok(verification) => verification,
            Err(e) => {
                println!("{e}");
                self.flow.reset();
                return None;
            }
        };
        info!(
            draft_restored = verification.draft.is_some(),
            "Signed in for consultation"
        );

        Some(self.intake.load_form().await)
    }

    async fn fill_and_submit(&mut self, mut form: ConsultationForm) {
        println!();
        println!("Consultation Request");

        loop {
            let Some(filled) = fill_form(&self.console, form.clone()).await else {
                return;
            };

            match self.intake.submit(self.flow.session(), filled.clone()).await {
                Ok(outcome) => {
                    info!(id = outcome.id(), "Consultation request submitted");
                    println!();
                    println!("{CONFIRMATION_TITLE}");
                    println!("{CONFIRMATION_BODY}");
                    return;
                }
                Err(SubmitError::Invalid(e)) => {
                    println!("{e}");
                    form = filled;
                }
                Err(e @ SubmitError::NotAuthenticated) => {
                    println!("{e}");
                    self.flow.reset();
                    return;
                }
                Err(e) => {
                    println!("{e}");
                    return;
                }
            }
        }
    }
}

/// Prompts for every field, showing the current value as the default.
async fn fill_form(console: &Console, form: ConsultationForm) -> Option<ConsultationForm> {
    let consultation_type = loop {
        let input = console
            .ask(&format!(
                "Consultation type (video/at_home) [{}]: ",
                form.consultation_type.as_str()
            ))
            .await?;
        if input.is_empty() {
            break form.consultation_type;
        }
        match parse_consultation_type(&input) {
            Some(consultation_type) => break consultation_type,
            None => println!("Please answer video or at_home."),
        }
    };

    let country = console.ask_or("Country", &form.country).await?;
    let language = console.ask_or("Preferred language", &form.language).await?;

    let urgency = loop {
        let input = console
            .ask(&format!(
                "Urgency (low/medium/high) [{}]: ",
                form.urgency.as_str()
            ))
            .await?;
        if input.is_empty() {
            break form.urgency;
        }
        match parse_urgency(&input) {
            Some(urgency) => break urgency,
            None => println!("Please answer low, medium or high."),
        }
    };

    let address = match consultation_type {
        ConsultationType::AtHome => console.ask_or("Address", &form.address).await?,
        ConsultationType::Video => form.address.clone(),
    };
    let summary = console.ask_or("Request summary", &form.summary).await?;

    Some(ConsultationForm {
        consultation_type,
        country,
        language,
        urgency,
        address,
        summary,
        ..form
    })
}
