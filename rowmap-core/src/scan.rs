use crate::{
    Context, Error, FieldDef, Layout, Result, RowLabeled, RowNames, Target,
    stream::{Stream, StreamExt},
};
use std::{marker::PhantomData, pin::Pin, sync::Arc};

/// Binds result rows to the fields of a [`Target`].
///
/// The label to field mapping is computed on the first row and reused as
/// long as the following rows share the same labels.
pub struct Scanner<T: Target> {
    layout: Layout,
    labels: Option<RowNames>,
    mapping: Vec<Option<(usize, usize)>>,
    _target: PhantomData<fn() -> T>,
}

impl<T: Target> Scanner<T> {
    pub fn new() -> Result<Self> {
        Ok(Self::with_layout(T::layout()?))
    }

    pub fn with_layout(layout: Layout) -> Self {
        Self {
            layout,
            labels: None,
            mapping: Vec::new(),
            _target: PhantomData,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn scan(&mut self, row: RowLabeled) -> Result<T> {
        let mut target = T::default();
        self.scan_into(row, &mut target)?;
        Ok(target)
    }

    /// Columns not mapped by the target are skipped.
    pub fn scan_into(&mut self, row: RowLabeled, target: &mut T) -> Result<()> {
        if !self
            .labels
            .as_ref()
            .is_some_and(|v| Arc::ptr_eq(v, &row.labels) || **v == *row.labels)
        {
            self.mapping = self.map_labels(&row.labels)?;
            self.labels = Some(row.labels.clone());
        }
        for (i, value) in row.values.into_vec().into_iter().enumerate() {
            let Some((part, index)) = self.mapping.get(i).copied().flatten() else {
                continue;
            };
            let (type_name, field) = self.field(part, index);
            let Some(record) = target.part_mut(part) else {
                return Err(Error::msg(format!(
                    "The target `{}` has no part at index {}",
                    std::any::type_name::<T>(),
                    part
                )));
            };
            record.set_field(index, value).with_context(|| {
                format!(
                    "Could not scan the column `{}` into the field `{}` of `{}`",
                    row.labels[i], field.field, type_name
                )
            })?;
        }
        Ok(())
    }

    fn field(&self, part: usize, index: usize) -> (&'static str, &'static FieldDef) {
        match &self.layout {
            Layout::Table(meta) => (meta.type_name(), &meta.fields()[index]),
            Layout::Join(parts) => {
                let meta = &parts[part].meta;
                (meta.type_name(), &meta.fields()[index])
            }
        }
    }

    fn map_labels(&self, labels: &[String]) -> Result<Vec<Option<(usize, usize)>>> {
        Ok(match &self.layout {
            Layout::Table(meta) => labels
                .iter()
                .map(|label| meta.field_index(label).map(|i| (0, i)))
                .collect(),
            Layout::Join(parts) => {
                let width = self.layout.width();
                if labels.len() != width {
                    return Err(Error::msg(format!(
                        "The joined struct `{}` expects {} columns, but the query returned {}",
                        std::any::type_name::<T>(),
                        width,
                        labels.len()
                    )));
                }
                parts
                    .iter()
                    .enumerate()
                    .flat_map(|(p, part)| (0..part.meta.fields().len()).map(move |i| Some((p, i))))
                    .collect()
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowsState {
    Fresh,
    OnRow,
    Exhausted,
    Closed,
}

/// Cursor over the rows returned by a query.
///
/// Call [`Rows::next`] to advance, then [`Rows::scan`] to bind the current
/// row. Dropping or closing the cursor releases the statement.
pub struct Rows<'s> {
    stream: Option<Pin<Box<dyn Stream<Item = Result<RowLabeled>> + Send + 's>>>,
    current: Option<RowLabeled>,
    state: RowsState,
}

impl<'s> Rows<'s> {
    pub fn new(stream: impl Stream<Item = Result<RowLabeled>> + Send + 's) -> Self {
        Self {
            stream: Some(Box::pin(stream)),
            current: None,
            state: RowsState::Fresh,
        }
    }

    /// Advance to the next row, returns `false` once the rows are exhausted.
    pub async fn next(&mut self) -> Result<bool> {
        if self.state == RowsState::Exhausted {
            return Ok(false);
        }
        if self.stream.is_none() {
            return Err(self.unavailable());
        }
        let next = match self.stream.as_mut() {
            Some(stream) => stream.next().await,
            None => None,
        };
        match next.transpose()? {
            Some(row) => {
                self.current = Some(row);
                self.state = RowsState::OnRow;
                Ok(true)
            }
            None => {
                self.current = None;
                self.stream = None;
                self.state = RowsState::Exhausted;
                Ok(false)
            }
        }
    }

    /// Labels of the current row.
    pub fn columns(&self) -> Option<&[String]> {
        self.current.as_ref().map(RowLabeled::names)
    }

    pub fn current(&self) -> Option<&RowLabeled> {
        self.current.as_ref()
    }

    /// Bind the current row into `target`.
    pub fn scan<T: Target>(&self, target: &mut T) -> Result<()> {
        let Some(row) = self.current.as_ref() else {
            return Err(self.unavailable());
        };
        Scanner::<T>::new()?.scan_into(row.clone(), target)
    }

    pub fn close(&mut self) -> Result<()> {
        self.stream = None;
        self.current = None;
        self.state = RowsState::Closed;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.state == RowsState::Closed
    }

    fn unavailable(&self) -> Error {
        Error::msg(match self.state {
            RowsState::Fresh => "rowmap::Rows: scan called before next",
            RowsState::OnRow => "rowmap::Rows: no row available",
            RowsState::Exhausted => "rowmap::Rows: the rows are exhausted",
            RowsState::Closed => "rowmap::Rows: the rows are closed",
        })
    }
}
