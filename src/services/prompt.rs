//! 校验提示词模板
//!
//! 一份模板，通过保险公司名称和页面布局参数适配不同的账单格式。
//! 占位符使用 `{{name}}` 形式；参考数据最后替换，
//! 因此 CSV 内容里出现的占位符文本不会被展开。

use serde::Deserialize;

const PLACEHOLDER_REFERENCE: &str = "{{reference_text}}";
const PLACEHOLDER_CARRIER: &str = "{{carrier}}";
const PLACEHOLDER_COVER: &str = "{{cover_pages}}";
const PLACEHOLDER_SUMMARY: &str = "{{summary_pages}}";
const PLACEHOLDER_DETAIL: &str = "{{detail_start_page}}";

/// Oracle 回复中表示存在差异的标记
pub const DISCREPANCY_MARKER: &str = "DISCREPANCY";

/// 账单 PDF 的页面布局
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageLayout {
    /// 封面页，例如 "1"
    pub cover_pages: String,
    /// 汇总页，例如 "2-3"
    pub summary_pages: String,
    /// 员工明细从第几页开始
    pub detail_start_page: u32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            cover_pages: "1".to_string(),
            summary_pages: "2-3".to_string(),
            detail_start_page: 4,
        }
    }
}

/// 校验提示词模板
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    body: String,
    carrier: String,
    layout: PageLayout,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE, "United Healthcare", PageLayout::default())
    }
}

impl PromptTemplate {
    pub fn new(body: impl Into<String>, carrier: impl Into<String>, layout: PageLayout) -> Self {
        Self {
            body: body.into(),
            carrier: carrier.into(),
            layout,
        }
    }

    /// 内置模板，指定保险公司和页面布局
    pub fn for_carrier(carrier: impl Into<String>, layout: PageLayout) -> Self {
        Self::new(DEFAULT_TEMPLATE, carrier, layout)
    }

    /// 替换模板正文，保留保险公司和布局参数
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// 模板是否包含参考数据占位符
    pub fn has_reference_slot(&self) -> bool {
        self.body.contains(PLACEHOLDER_REFERENCE)
    }

    /// 渲染提示词，把参考数据原样内联进去
    pub fn render(&self, reference_text: &str) -> String {
        let detail_start = self.layout.detail_start_page.to_string();
        self.body
            .replace(PLACEHOLDER_CARRIER, &self.carrier)
            .replace(PLACEHOLDER_COVER, &self.layout.cover_pages)
            .replace(PLACEHOLDER_SUMMARY, &self.layout.summary_pages)
            .replace(PLACEHOLDER_DETAIL, &detail_start)
            .replace(PLACEHOLDER_REFERENCE, reference_text)
    }
}

const DEFAULT_TEMPLATE: &str = r#"Here is the CSV data:

{{reference_text}}

---

**IMPORTANT: READ ALL PAGES OF THE PDF**
This is a {{carrier}} invoice with multiple pages:
- Page {{cover_pages}}: Cover page
- Pages {{summary_pages}}: Summary totals
- Pages {{detail_start_page}}+: DETAILED EMPLOYEE LISTINGS (read ALL remaining pages - there may be many pages of employee details)

Make sure you read the ENTIRE document to find ALL employee names.

**UNDERSTANDING THE CSV STRUCTURE**
The CSV lists EVERY covered person (employees, spouses and children).
For family coverage the SAME cost is repeated on every family member's row.
That is ONE employee with ONE cost, not several separate costs.

**HOW TO CHECK EACH ITEM:**

1. **Invoice Number**: find it on the cover page of the PDF and state it.

2. **Names**:
   - List ALL employee names from the detail pages of the PDF and count them.
   - From the CSV, list all unique first+last names where Relationship = "Employee" and count them.
   - If the counts and the names match, say "MATCH".
   - Only flag a discrepancy if the counts differ or specific names are missing from one document.

3. **Coverage Period**: state the coverage period from the PDF, then say "No coverage period in CSV to compare".

4. **Total Amounts**:
   - PDF: use the "Subtotal" (current charges BEFORE adjustments) from the summary pages.
   - Current adjustments (retroactive charges) are reported separately.
   - CSV: add each unique employee's Medical Plan Cost ONCE (ignore the duplicated family rows).
   - If they match within $1, say "MATCH"; otherwise state "PDF Current Charges: $X, CSV: $Y".
   - If the PDF shows adjustments, add: "PDF also shows $Z in retroactive adjustments".

5. **Employee Count**:
   - PDF: the "TOTAL" employee count on the summary pages.
   - CSV: the number of rows with Relationship = "Employee".
   - If equal, say "MATCH - Both have X employees"; otherwise "PDF has X, CSV has Y".

6. **Premium Per Employee**:
   - PDF: the "Totals" column of the detail pages, INCLUDING any "Adjustment Detail" entries (ADD, CHG, TRM).
   - CSV: the Medical Plan Cost on each Employee row.
   - List every employee whose PDF total differs from the CSV cost:
     "Employee Name: PDF $X (includes $Y adjustments), CSV $Z".

**CRITICAL COMPARISON RULES:**
- If two numbers are the SAME, that is a MATCH - do not flag it.
- Only flag discrepancies when values are actually DIFFERENT.
- Count each employee's CSV cost ONCE.
- An employee with adjustments has a HIGHER PDF total than the CSV cost - that IS a discrepancy.

Provide your response EXACTLY in this format:

**Status:** [MATCH or DISCREPANCY FOUND]

**Results:**
1. Invoice Number: [invoice number from PDF]
2. Names: [MATCH or the specific missing names and which document is missing them]
3. Coverage Period: [coverage period from PDF, then "No coverage period in CSV to compare"]
4. Total Amounts: [MATCH or "PDF: $X, CSV: $Y"]
5. Employee Count: [MATCH - Both have X employees OR "PDF has X, CSV has Y"]
6. Premium Per Employee: [MATCH or the employees with different premiums]

**Summary:** [One sentence: "All fields match" or "X discrepancies found in: [fields]"]"#;
