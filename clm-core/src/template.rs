//! Static training content: the employment agreement template and the
//! jargon pairs of the matching exercise.
//!
//! Placeholders are `[Bracketed Labels]`; optional clauses are wrapped in
//! `{braces}`. Every block sits on its own line, which the line-based clause
//! removal relies on.

use crate::matching::MatchingItem;

pub const EMPLOYMENT_AGREEMENT: &str = r#"<h1>EMPLOYMENT AGREEMENT</h1>
<p>This Employment Agreement (the "Agreement") is made and entered into on [Agreement Date] by and between:</p>
<p><strong>Employer:</strong> [Employer Name], a company registered at [Registered Address] (the "Company")</p>
<p><strong>Employee:</strong> [Employee Name], residing at [Employee Address], contactable at [Employee Email] (the "Employee")</p>
<h2>COMMENCEMENT OF EMPLOYMENT</h2>
<p>The Employee's employment under this Agreement shall commence on [Employment Start Date] or, if applicable, "on [Previous Employment Start Date] with previous continuous service taken into account".</p>
<h2>JOB TITLE AND DUTIES</h2>
<p>The Employee shall be employed as [Job Title]. The Employee's main duties are [Job Duties]. The Employee shall report to [Line Manager].</p>
<h2>PROBATIONARY PERIOD</h2>
<p>The first [Probation Period Length] of employment will be a probationary period. {The Company may extend the probationary period by up to [Probation Extension Length] at its discretion}</p>
<h2>PLACE OF WORK</h2>
<p>The Employee's normal place of work is [Normal Place of Work].</p>
<p>The Employee may also be required to work at [Additional Work Locations].</p>
<h2>REMUNERATION</h2>
<p>The Employee shall receive an annual gross salary of [USD] [Annual Salary], payable [Payment Frequency] in arrears.</p>
<p>{The Employee is entitled to overtime pay at a rate of [Overtime Pay Rate] for authorized overtime work} {The Employee shall not receive additional payment for overtime worked}</p>
<p>Company car provided: [Company Car]</p>
<h2>WORKING HOURS</h2>
<p>The Employee's normal working hours are [Working Hours] hours per week.</p>
<h2>HOLIDAY ENTITLEMENT</h2>
<p>The Employee is entitled to [Holiday Entitlement] days of paid holiday per year. On termination, the Employee will be paid for [Unused Holiday Days] days of accrued but untaken holiday, amounting to [Holiday Pay].</p>
<h2>SICKNESS ABSENCE</h2>
<p>The Employee is entitled to Statutory Sick Pay for up to [Sick Pay Weeks] weeks. {The Employee may also be entitled to Company sick pay of [Details of Company Sick Pay Policy]}</p>
<h2>PENSION</h2>
<p>The Employee will be enrolled in [Pension Scheme Name]. Questions about the scheme should be directed to [HR/Relevant Contact].</p>
<h2>TERMINATION</h2>
<p>Either party may terminate this Agreement by giving [Notice Period] written notice. (After the probationary period, the Company may terminate employment without notice in cases of gross misconduct.)</p>
<h2>CONFIDENTIALITY</h2>
<p>The Employee shall not, during or after employment, disclose any confidential information of the Company except as required by law.</p>
<h2>GOVERNING LAW</h2>
<p>This Agreement shall be governed by the laws of England and Wales.</p>
"#;

/// Term/definition pairs drilled by the matching exercise.
pub fn jargon() -> Vec<MatchingItem> {
    vec![
        MatchingItem::new(
            "1",
            "Document Automation",
            "Software that automatically fills in case-specific details to generate legal documents.",
        ),
        MatchingItem::new(
            "2",
            "Negotiation",
            "A stage in CLM where terms are reviewed, modified, and agreed upon by involved parties.",
        ),
        MatchingItem::new(
            "3",
            "Placeholders",
            "Template markers replaced with relevant data during contract generation.",
        ),
        MatchingItem::new(
            "4",
            "Conditions",
            "Rules that automate actions or changes within a contract based on predefined criteria.",
        ),
    ]
}
