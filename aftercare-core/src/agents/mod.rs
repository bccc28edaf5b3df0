mod clinical;
mod receptionist;

pub use clinical::{ClinicalAgent, ClinicalAnswer, NO_ANSWER_APOLOGY};
pub use receptionist::{ReceptionistAgent, ReceptionistReply, MEDICAL_KEYWORDS};
