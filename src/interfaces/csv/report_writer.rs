use crate::domain::account::Account;
use crate::domain::transaction::TransactionRecord;
use crate::error::Result;
use std::io::Write;

/// Writes engine state as CSV.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes `account,balance` rows. Balances are printed without trailing zeros.
    pub fn write_accounts(&mut self, accounts: impl IntoIterator<Item = Account>) -> Result<()> {
        self.writer.write_record(["account", "balance"])?;
        for account in accounts {
            self.writer
                .write_record([account.id, account.balance.to_string()])?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_transactions(
        &mut self,
        records: impl IntoIterator<Item = TransactionRecord>,
    ) -> Result<()> {
        self.writer.write_record([
            "transaction_id",
            "payer",
            "receiver",
            "amount",
            "status",
            "amount_deducted",
        ])?;
        for record in records {
            let amount = record.amount.to_string();
            self.writer.write_record([
                record.id.as_str(),
                record.payer_id.as_str(),
                record.receiver_id.as_str(),
                amount.as_str(),
                record.status().as_str(),
                if record.is_amount_deducted() { "true" } else { "false" },
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
