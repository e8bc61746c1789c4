use crate::TOOL_NAME;
use crate::report::model::{Report, RuleSummary};

pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} report for {}\n", TOOL_NAME, report.url));
    out.push_str(&format!("Generated: {}\n", report.timestamp));

    let buckets = [
        ("Violations", &report.violations),
        ("Passes", &report.passes),
        ("Incomplete", &report.incomplete),
        ("Inapplicable", &report.inapplicable),
    ];
    for (title, bucket) in buckets {
        if let Some(rules) = bucket {
            render_bucket(&mut out, title, rules);
        }
    }
    out
}

fn render_bucket(out: &mut String, title: &str, rules: &[RuleSummary]) {
    out.push_str(&format!("{} ({}):\n", title, rules.len()));
    for r in rules {
        let impact = r.impact.as_deref().unwrap_or("none");
        out.push_str(&format!("  - {} [{}] {}\n", r.id, impact, r.description));
        for n in &r.nodes {
            out.push_str(&format!("      {} {}\n", n.target.join(" "), n.html));
        }
    }
}
