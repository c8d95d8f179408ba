//! Interactive menu front end.
//!
//! Reads one answer per line from any [`BufRead`] and writes to any
//! [`Write`], so a whole session can be scripted. End of input behaves like
//! choosing "back" at every level.

use std::fmt::Display;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use sales_tax_core::calculations::SalesTaxCalculator;
use sales_tax_core::sales::quote_sale;
use sales_tax_core::{
    CatalogRepository, Category, CategoryPatch, NewCategory, NewProduct, Product,
    ProductCategory, ProductPatch, ProductStatus, SaleQuote, TaxBreakdown, default_vat_rate,
};
use tracing::{debug, info};

use crate::history::CalculationHistory;
use crate::reports::{self, TOP_N};
use crate::utils::{
    format_money, format_rate, optional_text, parse_decimal, parse_optional_decimal,
};

const RULE: &str = "------------------------------------------------------------";
const DEFAULT_RECENT: u32 = 10;

pub struct Console<'a, R, W> {
    repo: &'a dyn CatalogRepository,
    input: R,
    out: W,
    history: CalculationHistory,
    export_dir: PathBuf,
}

impl<'a, R: BufRead, W: Write> Console<'a, R, W> {
    pub fn new(
        repo: &'a dyn CatalogRepository,
        input: R,
        out: W,
    ) -> Self {
        Self {
            repo,
            input,
            out,
            history: CalculationHistory::new(),
            export_dir: PathBuf::from("."),
        }
    }

    /// Directory the calculation history is exported into.
    pub fn with_export_dir(
        mut self,
        dir: impl Into<PathBuf>,
    ) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn history(&self) -> &CalculationHistory {
        &self.history
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs the main menu until the user exits or input ends.
    pub async fn run(&mut self) -> Result<()> {
        info!("console session started");
        loop {
            self.menu(
                "SALES TAX CATALOG",
                &[
                    "Manage products",
                    "Manage categories",
                    "Manage transactions",
                    "View statistics",
                    "Tax calculator",
                    "Reports",
                    "Export calculation history",
                    "Load sample data",
                ],
                "Exit",
            )?;
            let Some(choice) = self.prompt("Select an option: ")? else {
                break;
            };
            match choice.as_str() {
                "1" => self.products_menu().await?,
                "2" => self.categories_menu().await?,
                "3" => self.transactions_menu().await?,
                "4" => self.show_statistics().await?,
                "5" => self.calculator_menu().await?,
                "6" => self.reports_menu().await?,
                "7" => self.export_history()?,
                "8" => self.load_sample_data().await?,
                "0" => {
                    writeln!(self.out, "Goodbye.")?;
                    break;
                }
                _ => self.invalid_option()?,
            }
        }
        info!(calculations = self.history.len(), "console session ended");
        Ok(())
    }

    // ── input/output helpers ─────────────────────────────────────────────

    fn menu(
        &mut self,
        title: &str,
        items: &[&str],
        back: &str,
    ) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{title}")?;
        writeln!(self.out, "{RULE}")?;
        for (i, item) in items.iter().enumerate() {
            writeln!(self.out, "{}. {item}", i + 1)?;
        }
        writeln!(self.out, "0. {back}")?;
        Ok(())
    }

    /// Trimmed answer, or `None` at end of input.
    fn prompt(
        &mut self,
        label: &str,
    ) -> Result<Option<String>> {
        write!(self.out, "{label}")?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn read_id(
        &mut self,
        label: &str,
    ) -> Result<Option<i64>> {
        let Some(text) = self.prompt(label)? else {
            return Ok(None);
        };
        match text.parse() {
            Ok(id) => Ok(Some(id)),
            Err(_) => {
                writeln!(self.out, "Invalid number.")?;
                Ok(None)
            }
        }
    }

    fn confirm(
        &mut self,
        question: &str,
    ) -> Result<bool> {
        let answer = self.prompt(&format!("{question} (y/n): "))?;
        Ok(matches!(answer.as_deref(), Some("y" | "Y" | "yes" | "Yes")))
    }

    fn fail(
        &mut self,
        err: impl Display,
    ) -> Result<()> {
        writeln!(self.out, "Error: {err}")?;
        Ok(())
    }

    fn invalid_option(&mut self) -> Result<()> {
        writeln!(self.out, "Invalid option.")?;
        Ok(())
    }

    // ── products ─────────────────────────────────────────────────────────

    async fn products_menu(&mut self) -> Result<()> {
        loop {
            self.menu(
                "PRODUCTS",
                &[
                    "Add product",
                    "List products",
                    "Find product by ID",
                    "Update product",
                    "Delete product",
                    "Products by category",
                ],
                "Back",
            )?;
            let Some(choice) = self.prompt("Select an option: ")? else {
                return Ok(());
            };
            match choice.as_str() {
                "1" => self.add_product().await?,
                "2" => self.list_products().await?,
                "3" => self.find_product().await?,
                "4" => self.update_product().await?,
                "5" => self.delete_product().await?,
                "6" => self.products_by_category().await?,
                "0" => return Ok(()),
                _ => self.invalid_option()?,
            }
        }
    }

    async fn add_product(&mut self) -> Result<()> {
        let categories = match self.repo.list_categories().await {
            Ok(categories) => categories,
            Err(e) => return self.fail(e),
        };
        if categories.is_empty() {
            writeln!(self.out, "Create a category first.")?;
            return Ok(());
        }

        let Some(name) = self.prompt("Name: ")? else {
            return Ok(());
        };
        let Some(description) = self.prompt("Description: ")? else {
            return Ok(());
        };
        let Some(price) = self.prompt("Base price: ")? else {
            return Ok(());
        };
        let price = match parse_decimal(&price) {
            Ok(price) => price,
            Err(e) => return self.fail(e),
        };

        self.print_categories(&categories)?;
        let Some(category_id) = self.read_id("Category ID: ")? else {
            return Ok(());
        };
        let Some(status) = self.prompt("Status (Active/Inactive/Discontinued) [Active]: ")? else {
            return Ok(());
        };
        let status = if status.is_empty() {
            ProductStatus::Active
        } else {
            match status.parse::<ProductStatus>() {
                Ok(status) => status,
                Err(e) => return self.fail(e),
            }
        };

        let product = match NewProduct::new(name, price, category_id) {
            Ok(product) => product.with_description(description).with_status(status),
            Err(e) => return self.fail(e),
        };
        match self.repo.create_product(product).await {
            Ok(product) => writeln!(
                self.out,
                "Product '{}' created with ID {}.",
                product.name, product.id
            )?,
            Err(e) => self.fail(e)?,
        }
        Ok(())
    }

    async fn list_products(&mut self) -> Result<()> {
        match self.repo.list_products().await {
            Ok(products) => self.print_products(&products),
            Err(e) => self.fail(e),
        }
    }

    async fn find_product(&mut self) -> Result<()> {
        let Some(id) = self.read_id("Product ID: ")? else {
            return Ok(());
        };
        match self.repo.get_product(id).await {
            Ok(product) => self.print_product(&product),
            Err(e) => self.fail(e),
        }
    }

    async fn update_product(&mut self) -> Result<()> {
        let Some(id) = self.read_id("Product ID: ")? else {
            return Ok(());
        };
        let product = match self.repo.get_product(id).await {
            Ok(product) => product,
            Err(e) => return self.fail(e),
        };
        writeln!(self.out, "Leave a field empty to keep its value.")?;

        let mut patch = ProductPatch::default();
        let Some(name) = self.prompt(&format!("Name [{}]: ", product.name))? else {
            return Ok(());
        };
        patch.name = optional_text(&name);
        let Some(description) = self.prompt(&format!("Description [{}]: ", product.description))?
        else {
            return Ok(());
        };
        patch.description = optional_text(&description);
        let Some(price) =
            self.prompt(&format!("Base price [{}]: ", format_money(product.base_price)))?
        else {
            return Ok(());
        };
        patch.base_price = match parse_optional_decimal(&price) {
            Ok(price) => price,
            Err(e) => return self.fail(e),
        };
        let Some(category) = self.prompt(&format!("Category ID [{}]: ", product.category_id))?
        else {
            return Ok(());
        };
        if let Some(text) = optional_text(&category) {
            match text.parse() {
                Ok(category_id) => patch.category_id = Some(category_id),
                Err(_) => return self.fail(format!("'{text}' is not a category ID")),
            }
        }
        let Some(status) = self.prompt(&format!("Status [{}]: ", product.status))? else {
            return Ok(());
        };
        if let Some(text) = optional_text(&status) {
            match text.parse::<ProductStatus>() {
                Ok(status) => patch.status = Some(status),
                Err(e) => return self.fail(e),
            }
        }

        if patch.is_empty() {
            writeln!(self.out, "No changes.")?;
            return Ok(());
        }
        match self.repo.update_product(id, patch).await {
            Ok(product) => writeln!(self.out, "Product '{}' updated.", product.name)?,
            Err(e) => self.fail(e)?,
        }
        Ok(())
    }

    async fn delete_product(&mut self) -> Result<()> {
        let Some(id) = self.read_id("Product ID: ")? else {
            return Ok(());
        };
        let product = match self.repo.get_product(id).await {
            Ok(product) => product,
            Err(e) => return self.fail(e),
        };
        if !self.confirm(&format!("Delete product '{}'?", product.name))? {
            writeln!(self.out, "Cancelled.")?;
            return Ok(());
        }
        match self.repo.delete_product(id).await {
            Ok(()) => writeln!(self.out, "Product deleted.")?,
            Err(e) => self.fail(e)?,
        }
        Ok(())
    }

    async fn products_by_category(&mut self) -> Result<()> {
        let categories = match self.repo.list_categories().await {
            Ok(categories) => categories,
            Err(e) => return self.fail(e),
        };
        self.print_categories(&categories)?;
        let Some(id) = self.read_id("Category ID: ")? else {
            return Ok(());
        };
        match self.repo.list_products_by_category(id).await {
            Ok(products) => self.print_products(&products),
            Err(e) => self.fail(e),
        }
    }

    fn print_products(
        &mut self,
        products: &[Product],
    ) -> Result<()> {
        if products.is_empty() {
            writeln!(self.out, "No products registered.")?;
            return Ok(());
        }
        writeln!(
            self.out,
            "{:<4} {:<24} {:<18} {:>16} Status",
            "ID", "Name", "Category", "Price"
        )?;
        writeln!(self.out, "{RULE}{RULE}")?;
        for p in products {
            writeln!(
                self.out,
                "{:<4} {:<24} {:<18} {:>16} {}",
                p.id,
                p.name,
                p.category_name,
                format_money(p.base_price),
                p.status
            )?;
        }
        Ok(())
    }

    fn print_product(
        &mut self,
        product: &Product,
    ) -> Result<()> {
        writeln!(self.out, "ID: {}", product.id)?;
        writeln!(self.out, "Name: {}", product.name)?;
        writeln!(self.out, "Description: {}", product.description)?;
        writeln!(self.out, "Base price: {}", format_money(product.base_price))?;
        writeln!(
            self.out,
            "Category: {} (VAT {})",
            product.category_name,
            format_rate(product.category_vat_rate)
        )?;
        writeln!(self.out, "Status: {}", product.status)?;
        writeln!(
            self.out,
            "Created: {}",
            product.created_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(
            self.out,
            "Updated: {}",
            product.updated_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        Ok(())
    }

    // ── categories ───────────────────────────────────────────────────────

    async fn categories_menu(&mut self) -> Result<()> {
        loop {
            self.menu(
                "CATEGORIES",
                &[
                    "Add category",
                    "List categories",
                    "Update category",
                    "Delete category",
                ],
                "Back",
            )?;
            let Some(choice) = self.prompt("Select an option: ")? else {
                return Ok(());
            };
            match choice.as_str() {
                "1" => self.add_category().await?,
                "2" => self.list_categories().await?,
                "3" => self.update_category().await?,
                "4" => self.delete_category().await?,
                "0" => return Ok(()),
                _ => self.invalid_option()?,
            }
        }
    }

    async fn add_category(&mut self) -> Result<()> {
        let Some(name) = self.prompt("Name: ")? else {
            return Ok(());
        };
        let Some(description) = self.prompt("Description: ")? else {
            return Ok(());
        };
        let default_rate = default_vat_rate();
        let Some(rate) = self.prompt(&format!("VAT rate as a fraction [{default_rate}]: "))? else {
            return Ok(());
        };
        let rate = match parse_optional_decimal(&rate) {
            Ok(rate) => rate.unwrap_or(default_rate),
            Err(e) => return self.fail(e),
        };

        let category = match NewCategory::new(name, description, rate) {
            Ok(category) => category,
            Err(e) => return self.fail(e),
        };
        match self.repo.create_category(category).await {
            Ok(category) => writeln!(
                self.out,
                "Category '{}' created with ID {}.",
                category.name, category.id
            )?,
            Err(e) => self.fail(e)?,
        }
        Ok(())
    }

    async fn list_categories(&mut self) -> Result<()> {
        match self.repo.list_categories().await {
            Ok(categories) => self.print_categories(&categories),
            Err(e) => self.fail(e),
        }
    }

    async fn update_category(&mut self) -> Result<()> {
        let Some(id) = self.read_id("Category ID: ")? else {
            return Ok(());
        };
        let category = match self.repo.get_category(id).await {
            Ok(category) => category,
            Err(e) => return self.fail(e),
        };
        writeln!(self.out, "Leave a field empty to keep its value.")?;

        let mut patch = CategoryPatch::default();
        let Some(name) = self.prompt(&format!("Name [{}]: ", category.name))? else {
            return Ok(());
        };
        patch.name = optional_text(&name);
        let Some(description) =
            self.prompt(&format!("Description [{}]: ", category.description))?
        else {
            return Ok(());
        };
        patch.description = optional_text(&description);
        let Some(rate) = self.prompt(&format!("VAT rate [{}]: ", category.vat_rate))? else {
            return Ok(());
        };
        patch.vat_rate = match parse_optional_decimal(&rate) {
            Ok(rate) => rate,
            Err(e) => return self.fail(e),
        };

        if patch.is_empty() {
            writeln!(self.out, "No changes.")?;
            return Ok(());
        }
        match self.repo.update_category(id, patch).await {
            Ok(category) => writeln!(self.out, "Category '{}' updated.", category.name)?,
            Err(e) => self.fail(e)?,
        }
        Ok(())
    }

    async fn delete_category(&mut self) -> Result<()> {
        let Some(id) = self.read_id("Category ID: ")? else {
            return Ok(());
        };
        let category = match self.repo.get_category(id).await {
            Ok(category) => category,
            Err(e) => return self.fail(e),
        };
        if !self.confirm(&format!("Delete category '{}'?", category.name))? {
            writeln!(self.out, "Cancelled.")?;
            return Ok(());
        }
        match self.repo.delete_category(id).await {
            Ok(()) => writeln!(self.out, "Category deleted.")?,
            Err(e) => self.fail(e)?,
        }
        Ok(())
    }

    fn print_categories(
        &mut self,
        categories: &[Category],
    ) -> Result<()> {
        if categories.is_empty() {
            writeln!(self.out, "No categories registered.")?;
            return Ok(());
        }
        writeln!(self.out, "{:<4} {:<20} {:>6} Description", "ID", "Name", "VAT")?;
        writeln!(self.out, "{RULE}")?;
        for c in categories {
            writeln!(
                self.out,
                "{:<4} {:<20} {:>6} {}",
                c.id,
                c.name,
                format_rate(c.vat_rate),
                c.description
            )?;
        }
        Ok(())
    }

    // ── transactions ─────────────────────────────────────────────────────

    async fn transactions_menu(&mut self) -> Result<()> {
        loop {
            self.menu(
                "TRANSACTIONS",
                &["Record sale", "Recent transactions", "Quote a sale"],
                "Back",
            )?;
            let Some(choice) = self.prompt("Select an option: ")? else {
                return Ok(());
            };
            match choice.as_str() {
                "1" => self.record_sale().await?,
                "2" => self.recent_transactions().await?,
                "3" => self.quote().await?,
                "0" => return Ok(()),
                _ => self.invalid_option()?,
            }
        }
    }

    /// Reads a product and quantity and prices the sale.
    async fn read_quote(&mut self) -> Result<Option<SaleQuote>> {
        let Some(product_id) = self.read_id("Product ID: ")? else {
            return Ok(None);
        };
        let Some(quantity) = self.read_id("Quantity: ")? else {
            return Ok(None);
        };
        match quote_sale(self.repo, product_id, quantity).await {
            Ok(quote) => {
                self.print_quote(&quote)?;
                Ok(Some(quote))
            }
            Err(e) => {
                self.fail(e)?;
                Ok(None)
            }
        }
    }

    async fn record_sale(&mut self) -> Result<()> {
        let products = match self.repo.list_products().await {
            Ok(products) => products,
            Err(e) => return self.fail(e),
        };
        let active: Vec<Product> = products
            .into_iter()
            .filter(|p| p.status.is_sellable())
            .collect();
        if active.is_empty() {
            writeln!(self.out, "No active products available.")?;
            return Ok(());
        }
        writeln!(self.out, "Available products:")?;
        for p in &active {
            writeln!(self.out, "  {}. {} - {}", p.id, p.name, format_money(p.base_price))?;
        }

        let Some(quote) = self.read_quote().await? else {
            return Ok(());
        };
        if !self.confirm("Confirm sale?")? {
            writeln!(self.out, "Sale cancelled.")?;
            return Ok(());
        }

        // Store exactly what was shown and confirmed.
        match self.repo.create_transaction(quote.to_new_transaction()).await {
            Ok(tx) => {
                debug!(transaction_id = tx.id, "sale confirmed at the console");
                writeln!(self.out, "Sale recorded with ID {}.", tx.id)?;
            }
            Err(e) => self.fail(e)?,
        }
        Ok(())
    }

    async fn quote(&mut self) -> Result<()> {
        self.read_quote().await?;
        Ok(())
    }

    async fn recent_transactions(&mut self) -> Result<()> {
        let Some(limit) =
            self.prompt(&format!("Number of transactions to show [{DEFAULT_RECENT}]: "))?
        else {
            return Ok(());
        };
        let limit = if limit.is_empty() {
            DEFAULT_RECENT
        } else {
            match limit.parse::<u32>() {
                Ok(limit) => limit,
                Err(_) => {
                    writeln!(self.out, "Invalid number.")?;
                    return Ok(());
                }
            }
        };

        let transactions = match self.repo.list_recent_transactions(limit).await {
            Ok(transactions) => transactions,
            Err(e) => return self.fail(e),
        };
        if transactions.is_empty() {
            writeln!(self.out, "No transactions registered.")?;
            return Ok(());
        }
        writeln!(
            self.out,
            "{:<4} {:<24} {:>5} {:>16} Date",
            "ID", "Product", "Qty", "Total"
        )?;
        writeln!(self.out, "{RULE}{RULE}")?;
        for tx in &transactions {
            writeln!(
                self.out,
                "{:<4} {:<24} {:>5} {:>16} {}",
                tx.id,
                tx.product_name,
                tx.quantity,
                format_money(tx.total_final),
                tx.created_at.format("%Y-%m-%d %H:%M:%S")
            )?;
        }
        Ok(())
    }

    fn print_quote(
        &mut self,
        quote: &SaleQuote,
    ) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "SALE SUMMARY")?;
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out, "Product: {}", quote.product_name)?;
        writeln!(self.out, "Quantity: {}", quote.quantity)?;
        writeln!(self.out, "Unit price: {}", format_money(quote.unit_price))?;
        writeln!(self.out, "Subtotal: {}", format_money(quote.subtotal))?;
        writeln!(self.out, "Taxes: {}", format_money(quote.total_tax))?;
        writeln!(self.out, "Total: {}", format_money(quote.total_final))?;
        Ok(())
    }

    // ── statistics ───────────────────────────────────────────────────────

    async fn show_statistics(&mut self) -> Result<()> {
        let stats = match self.repo.get_statistics().await {
            Ok(stats) => stats,
            Err(e) => return self.fail(e),
        };
        writeln!(self.out)?;
        writeln!(self.out, "STATISTICS")?;
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out, "Total categories: {}", stats.total_categories)?;
        writeln!(self.out, "Total products: {}", stats.total_products)?;
        writeln!(self.out, "Total transactions: {}", stats.total_transactions)?;
        writeln!(self.out, "Total sales: {}", format_money(stats.total_sales))?;
        if !stats.products_by_status.is_empty() {
            writeln!(self.out, "Products by status:")?;
            for (status, count) in &stats.products_by_status {
                writeln!(self.out, "  - {status}: {count}")?;
            }
        }
        Ok(())
    }

    // ── calculator ───────────────────────────────────────────────────────

    async fn calculator_menu(&mut self) -> Result<()> {
        loop {
            self.menu(
                "TAX CALCULATOR",
                &["Calculate tax", "Taxes by category", "Session history"],
                "Back",
            )?;
            let Some(choice) = self.prompt("Select an option: ")? else {
                return Ok(());
            };
            match choice.as_str() {
                "1" => self.calculate()?,
                "2" => self.taxes_by_category()?,
                "3" => self.show_history()?,
                "0" => return Ok(()),
                _ => self.invalid_option()?,
            }
        }
    }

    fn calculate(&mut self) -> Result<()> {
        let Some(base_value) = self.prompt("Base value: ")? else {
            return Ok(());
        };
        let Some(category) = self.choose_category()? else {
            return Ok(());
        };

        match SalesTaxCalculator::standard().calculate_from_input(&base_value, category.as_str()) {
            Ok(breakdown) => {
                self.print_breakdown(&breakdown)?;
                self.history.record(breakdown);
            }
            Err(e) => self.fail(e)?,
        }
        Ok(())
    }

    fn choose_category(&mut self) -> Result<Option<ProductCategory>> {
        writeln!(self.out, "Categories:")?;
        for (i, category) in ProductCategory::ALL.iter().enumerate() {
            writeln!(self.out, "  {}. {category}", i + 1)?;
        }
        let Some(choice) = self.prompt("Select a category (number): ")? else {
            return Ok(None);
        };
        let picked = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| ProductCategory::ALL.get(i).copied());
        if picked.is_none() {
            writeln!(self.out, "Invalid category.")?;
        }
        Ok(picked)
    }

    fn print_breakdown(
        &mut self,
        breakdown: &TaxBreakdown,
    ) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "CALCULATION RESULT")?;
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out, "Base value: {}", format_money(breakdown.base_value))?;
        writeln!(self.out, "Category: {}", breakdown.category)?;
        writeln!(self.out, "Tax breakdown:")?;
        let charged: Vec<_> = breakdown
            .lines
            .iter()
            .filter(|line| !line.amount.is_zero())
            .collect();
        if charged.is_empty() {
            writeln!(self.out, "  (no taxes apply)")?;
        }
        for line in charged {
            writeln!(self.out, "  - {}: {}", line.name, format_money(line.amount))?;
        }
        writeln!(self.out, "Total taxes: {}", format_money(breakdown.total_tax))?;
        writeln!(self.out, "Total value: {}", format_money(breakdown.total_value))?;
        Ok(())
    }

    fn taxes_by_category(&mut self) -> Result<()> {
        for category in ProductCategory::ALL {
            let taxes: Vec<String> = category
                .tax_types()
                .iter()
                .map(|tax| format!("{} ({})", tax.name(), format_rate(tax.rate())))
                .collect();
            writeln!(self.out, "{category}: {}", taxes.join(", "))?;
        }
        Ok(())
    }

    fn show_history(&mut self) -> Result<()> {
        if self.history.is_empty() {
            writeln!(self.out, "No calculations yet.")?;
            return Ok(());
        }
        writeln!(self.out, "{} calculation(s) this session:", self.history.len())?;
        for (i, entry) in self.history.entries().iter().enumerate() {
            writeln!(
                self.out,
                "{}. {} {} {} -> {}",
                i + 1,
                entry.timestamp.format("%H:%M:%S"),
                entry.result.category,
                format_money(entry.result.base_value),
                format_money(entry.result.total_value)
            )?;
        }
        Ok(())
    }

    fn export_history(&mut self) -> Result<()> {
        match self.history.export_to_dir(&self.export_dir) {
            Ok(path) => writeln!(self.out, "History exported to {}", path.display())?,
            Err(e) => self.fail(e)?,
        }
        Ok(())
    }

    // ── reports ──────────────────────────────────────────────────────────

    async fn reports_menu(&mut self) -> Result<()> {
        loop {
            self.menu(
                "REPORTS",
                &[
                    "Most expensive products",
                    "Cheapest products",
                    "Sales by category",
                    "Products by status",
                ],
                "Back",
            )?;
            let Some(choice) = self.prompt("Select an option: ")? else {
                return Ok(());
            };
            match choice.as_str() {
                "1" => self.price_ranking(true).await?,
                "2" => self.price_ranking(false).await?,
                "3" => self.sales_by_category().await?,
                "4" => self.products_by_status().await?,
                "0" => return Ok(()),
                _ => self.invalid_option()?,
            }
        }
    }

    async fn price_ranking(
        &mut self,
        most_expensive: bool,
    ) -> Result<()> {
        let products = match self.repo.list_products().await {
            Ok(products) => products,
            Err(e) => return self.fail(e),
        };
        if products.is_empty() {
            writeln!(self.out, "No products registered.")?;
            return Ok(());
        }

        let (title, ranked) = if most_expensive {
            ("most expensive", reports::most_expensive(&products, TOP_N))
        } else {
            ("cheapest", reports::cheapest(&products, TOP_N))
        };
        writeln!(self.out, "Top {TOP_N} {title} products:")?;
        for (i, p) in ranked.iter().enumerate() {
            writeln!(self.out, "{}. {} - {}", i + 1, p.name, format_money(p.base_price))?;
        }
        Ok(())
    }

    async fn sales_by_category(&mut self) -> Result<()> {
        let sales = match reports::load_sales_by_category(self.repo).await {
            Ok(sales) => sales,
            Err(e) => return self.fail(e),
        };
        if sales.is_empty() {
            writeln!(self.out, "No transactions registered.")?;
            return Ok(());
        }
        writeln!(self.out, "{:<20} {:>10} {:>16}", "Category", "Quantity", "Total")?;
        writeln!(self.out, "{RULE}")?;
        for row in &sales {
            writeln!(
                self.out,
                "{:<20} {:>10} {:>16}",
                row.category,
                row.quantity,
                format_money(row.total)
            )?;
        }
        Ok(())
    }

    async fn products_by_status(&mut self) -> Result<()> {
        let products = match self.repo.list_products().await {
            Ok(products) => products,
            Err(e) => return self.fail(e),
        };
        if products.is_empty() {
            writeln!(self.out, "No products registered.")?;
            return Ok(());
        }
        for group in reports::products_by_status(&products) {
            writeln!(self.out, "{} ({} products):", group.status, group.products.len())?;
            for p in &group.products {
                writeln!(self.out, "  - {} - {}", p.name, format_money(p.base_price))?;
            }
        }
        Ok(())
    }

    // ── sample data ──────────────────────────────────────────────────────

    async fn load_sample_data(&mut self) -> Result<()> {
        match self.repo.seed_sample_data().await {
            Ok(summary) => writeln!(
                self.out,
                "Sample data loaded: {} categories, {} products, {} additional taxes.",
                summary.categories, summary.products, summary.additional_taxes
            )?,
            Err(e) => self.fail(e)?,
        }
        Ok(())
    }
}
