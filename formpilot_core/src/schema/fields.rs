//! Field table of the commercial insurance application form.

use super::{FieldDefault, FieldSchema, GroupKind};

/// Field set by edit commands such as "raise the deductible".
pub const DEDUCTIBLE_FIELD: &str = "deductible";

pub static CANONICAL_FIELDS: &[FieldSchema] = &[
    FieldSchema::boolean(
        "billingPlanForPolicyIsDirect",
        "Whether the policy is billed directly by the carrier",
    ),
    FieldSchema::boolean(
        "applicantIsLLC",
        "Whether the applicant business is organized as an LLC",
    ),
    FieldSchema::text(
        "dateOfApplication",
        "The date of application in YYYY-MM-DD format",
    ),
    FieldSchema::text("agency", "The agency name"),
    FieldSchema::text("carrier", "The insurance carrier name"),
    FieldSchema::text("naicCode", "The NAIC code"),
    FieldSchema::text(
        "companyPolicyOrProgramName",
        "The company policy or program name",
    ),
    FieldSchema::text("programCode", "The program code"),
    FieldSchema::text("agencyCustomerId", "The agency customer ID"),
    FieldSchema::boolean(
        "hasBusinessOwnersAttachedSections",
        "Whether business owners sections are attached",
    ),
    FieldSchema::boolean(
        "hasCommercialGeneralLiabilitySectionsAttached",
        "Whether commercial general liability sections are attached",
    ),
    FieldSchema::text("paymentPlan", "The payment plan"),
    FieldSchema::text("methodOfPayment", "The method of payment"),
    FieldSchema::text("audit1", "Audit information"),
    FieldSchema::text("applicantName", "The applicant's legal business name"),
    FieldSchema::group(
        "applicantName1",
        GroupKind::Name,
        "the main contact or applicant",
    ),
    FieldSchema::text("glCode1", "The GL code"),
    FieldSchema::text("sic1", "The SIC code"),
    FieldSchema::text("naics1", "The NAICS code"),
    FieldSchema::text("feinOrSocSec1", "The FEIN or SSN"),
    FieldSchema::group("websiteAddress", GroupKind::Address, "the website address"),
    FieldSchema::text(
        "contactInformationPrimary1",
        "The primary contact information, such as the primary email",
    ),
    FieldSchema::text(
        "contactInformationSecondary1",
        "The secondary contact information",
    ),
    FieldSchema::group("premisesZipcode", GroupKind::Address, "the premises"),
    FieldSchema::text("agencyCustomerId1", "The agency customer ID (secondary)"),
    FieldSchema::text("location", "The location number"),
    FieldSchema::number(
        "numberOfFullTimeEmployees",
        "The number of full-time employees",
    ),
    FieldSchema::text("building", "The building number"),
    FieldSchema::group("county", GroupKind::Address, "the county"),
    FieldSchema::text("location1", "The location number (secondary)"),
    FieldSchema::number(
        "partTimeEmployeesNumber",
        "The number of part-time employees",
    ),
    FieldSchema::text("building1", "The building number (secondary)"),
    FieldSchema::text("annualRevenues", "The annual revenues"),
    FieldSchema::text("location2", "The location number (tertiary)"),
    FieldSchema::text("building2", "The building number (tertiary)"),
    FieldSchema::text("location3", "The location number (quaternary)"),
    FieldSchema::text("building3", "The building number (quaternary)"),
    FieldSchema::text(
        "descriptionOfPrimaryOperations",
        "Description of primary operations",
    ),
    FieldSchema::text("agencyCustomerId2", "The agency customer ID (tertiary)"),
    FieldSchema::text(
        "priorCarrierForGeneralLiability",
        "The prior carrier for general liability",
    ),
    FieldSchema::text(
        "priorCarrierForAutomobile",
        "The prior carrier for automobile",
    ),
    FieldSchema::text("priorCarrierForProperty", "The prior carrier for property"),
    FieldSchema::text("agencyCustomerId3", "The agency customer ID (quaternary)"),
    FieldSchema::text("producersName", "The producer's name"),
    FieldSchema::text("depositAmount", "The deposit amount"),
    FieldSchema::text("minimumPremium", "The minimum premium"),
    FieldSchema::text("policyPremium", "The policy premium"),
    FieldSchema::boolean(
        "hasEquipmentFloaterSectionsAttached",
        "Whether equipment floater sections are attached",
    ),
    FieldSchema::boolean(
        "hasElectronicDataProcSectionAttached",
        "Whether electronic data processing sections are attached",
    ),
    FieldSchema::boolean(
        "hasAccountsReceivableAttached",
        "Whether accounts receivable sections are attached",
    ),
    FieldSchema::boolean(
        "hasBoilerAndMachinery",
        "Whether boiler and machinery sections are attached",
    ),
    FieldSchema::boolean(
        "hasBusinessAuto",
        "Whether business auto sections are attached",
    ),
    FieldSchema::boolean(
        "hasPropertySectionsAttached",
        "Whether property sections are attached",
    ),
    FieldSchema::boolean(
        "hasTruckersMotorCarrierSectionsAttached",
        "Whether truckers motor carrier sections are attached",
    ),
    FieldSchema::boolean(
        "hasTransportationSectionsAttached",
        "Whether transportation sections are attached",
    ),
    FieldSchema::text("policyNumber", "The policy number"),
    FieldSchema::text("agencyContactName", "The agency contact name"),
    FieldSchema::text("agencyContactPhone", "The agency contact phone"),
    FieldSchema::text("agencyEmailAddress", "The agency email address"),
    FieldSchema::text("proposedEffectiveDate", "The proposed effective date"),
    FieldSchema::boolean(
        "billingPlanIsAgency",
        "Whether the billing plan is agency billed",
    ),
    FieldSchema::boolean(
        "field16f996340b2011f083dfd3961689d753",
        "Whether the billing plan is direct billed",
    ),
    FieldSchema::boolean(
        "applicantIsNotForProfit",
        "Whether the applicant is a not-for-profit organization",
    ),
    FieldSchema::text("applicantContactName", "The applicant contact name"),
    FieldSchema::text("applicantPhoneNumber", "The applicant phone number"),
    FieldSchema::text("applicantEmailAddress", "The applicant email address"),
    FieldSchema::text("premisesState", "The premises state"),
    FieldSchema::boolean(
        "hasFormalSafetyProgram",
        "Whether there is a formal safety program",
    ),
    FieldSchema::boolean("followsOsha", "Whether OSHA guidelines are followed"),
    FieldSchema::boolean(
        "hasSafetyPosition",
        "Whether there is a dedicated safety position",
    ),
    FieldSchema::edit_only(DEDUCTIBLE_FIELD, FieldDefault::EmptyText),
];
